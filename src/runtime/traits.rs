//! Trait abstractions for runtime I/O
//!
//! The dispatcher only talks to these traits, so tests swap in mocks from
//! `testing`.

use super::error::{LedgerError, PresentError, StoreError};
use crate::db::{Database, Transaction};
use crate::state_machine::{DialogueState, OperationType};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Per-user dialogue state. At most one record per user; writes overwrite.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Stored state, `None` when the user has no live dialogue
    async fn get(&self, user_id: &str) -> Result<Option<DialogueState>, StoreError>;

    async fn put(&self, user_id: &str, state: &DialogueState) -> Result<(), StoreError>;

    async fn clear(&self, user_id: &str) -> Result<(), StoreError>;
}

/// Turns presentation effects into chat messages
#[async_trait]
pub trait Presenter: Send + Sync {
    async fn show_main_menu(&self, user_id: &str) -> Result<(), PresentError>;

    async fn prompt(&self, user_id: &str, text: &str) -> Result<(), PresentError>;

    async fn show_categories(
        &self,
        user_id: &str,
        operation_type: OperationType,
        labels: &[String],
    ) -> Result<(), PresentError>;

    async fn confirm(
        &self,
        user_id: &str,
        amount: u64,
        operation_type: OperationType,
        category: &str,
    ) -> Result<(), PresentError>;
}

/// Where completed transactions go
#[async_trait]
pub trait Ledger: Send + Sync {
    /// Store a transaction. Recording the same `id` twice must not duplicate it.
    async fn record(&self, transaction: &Transaction) -> Result<(), LedgerError>;

    /// Transactions of a user, newest first
    async fn list(&self, user_id: &str) -> Result<Vec<Transaction>, LedgerError>;
}

// ============================================================================
// Arc implementations for trait objects
// ============================================================================

#[async_trait]
impl<T: SessionStore + ?Sized> SessionStore for Arc<T> {
    async fn get(&self, user_id: &str) -> Result<Option<DialogueState>, StoreError> {
        (**self).get(user_id).await
    }

    async fn put(&self, user_id: &str, state: &DialogueState) -> Result<(), StoreError> {
        (**self).put(user_id, state).await
    }

    async fn clear(&self, user_id: &str) -> Result<(), StoreError> {
        (**self).clear(user_id).await
    }
}

#[async_trait]
impl<T: Presenter + ?Sized> Presenter for Arc<T> {
    async fn show_main_menu(&self, user_id: &str) -> Result<(), PresentError> {
        (**self).show_main_menu(user_id).await
    }

    async fn prompt(&self, user_id: &str, text: &str) -> Result<(), PresentError> {
        (**self).prompt(user_id, text).await
    }

    async fn show_categories(
        &self,
        user_id: &str,
        operation_type: OperationType,
        labels: &[String],
    ) -> Result<(), PresentError> {
        (**self)
            .show_categories(user_id, operation_type, labels)
            .await
    }

    async fn confirm(
        &self,
        user_id: &str,
        amount: u64,
        operation_type: OperationType,
        category: &str,
    ) -> Result<(), PresentError> {
        (**self)
            .confirm(user_id, amount, operation_type, category)
            .await
    }
}

#[async_trait]
impl<T: Ledger + ?Sized> Ledger for Arc<T> {
    async fn record(&self, transaction: &Transaction) -> Result<(), LedgerError> {
        (**self).record(transaction).await
    }

    async fn list(&self, user_id: &str) -> Result<Vec<Transaction>, LedgerError> {
        (**self).list(user_id).await
    }
}

// ============================================================================
// Production Adapters
// ============================================================================

/// Ephemeral session store; sessions are lost on restart
#[derive(Default)]
pub struct InMemorySessionStore {
    sessions: RwLock<HashMap<String, DialogueState>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn get(&self, user_id: &str) -> Result<Option<DialogueState>, StoreError> {
        Ok(self.sessions.read().await.get(user_id).copied())
    }

    async fn put(&self, user_id: &str, state: &DialogueState) -> Result<(), StoreError> {
        self.sessions
            .write()
            .await
            .insert(user_id.to_string(), *state);
        Ok(())
    }

    async fn clear(&self, user_id: &str) -> Result<(), StoreError> {
        self.sessions.write().await.remove(user_id);
        Ok(())
    }
}

/// Adapter to use `Database` as durable session store and ledger
#[derive(Clone)]
pub struct DatabaseStorage {
    db: Database,
}

impl DatabaseStorage {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

#[async_trait]
impl SessionStore for DatabaseStorage {
    async fn get(&self, user_id: &str) -> Result<Option<DialogueState>, StoreError> {
        Ok(self.db.get_session(user_id)?)
    }

    async fn put(&self, user_id: &str, state: &DialogueState) -> Result<(), StoreError> {
        Ok(self.db.put_session(user_id, state)?)
    }

    async fn clear(&self, user_id: &str) -> Result<(), StoreError> {
        Ok(self.db.clear_session(user_id)?)
    }
}

#[async_trait]
impl Ledger for DatabaseStorage {
    async fn record(&self, transaction: &Transaction) -> Result<(), LedgerError> {
        Ok(self.db.insert_transaction(transaction)?)
    }

    async fn list(&self, user_id: &str) -> Result<Vec<Transaction>, LedgerError> {
        Ok(self.db.list_transactions(user_id)?)
    }
}

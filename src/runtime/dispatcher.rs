//! Event dispatcher
//!
//! Loads the session, runs the pure transition, then executes the returned
//! effects in order. Events for one user go through a FIFO lane so only one
//! transition per user is in flight; different users never wait on each
//! other.

use super::error::DispatchError;
use super::inbound::InboundEvent;
use super::traits::{Ledger, Presenter, SessionStore};
use crate::catalog::CategoryCatalog;
use crate::db::Transaction;
use crate::state_machine::{
    transition, DialogueContext, DialogueState, Effect, Event, RecordedTransaction,
};
use chrono::Utc;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

/// How hard to try before giving up on a ledger write
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl RetryPolicy {
    pub const DEFAULT_ATTEMPTS: u32 = 3;

    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
        }
    }

    /// Exponential backoff: base, 2*base, 4*base, ...
    pub fn delay(&self, attempt: u32) -> Duration {
        self.base_delay
            .saturating_mul(1u32 << attempt.saturating_sub(1).min(16))
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(Self::DEFAULT_ATTEMPTS, Duration::from_millis(100))
    }
}

/// What happened to an inbound event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// Input was undecodable or did not apply in the current state
    Ignored,
    /// Effects were executed; carries the state after the transition
    Handled { state: DialogueState },
}

impl DispatchOutcome {
    pub fn is_handled(&self) -> bool {
        matches!(self, DispatchOutcome::Handled { .. })
    }
}

type Lane = Arc<tokio::sync::Mutex<()>>;

pub struct Dispatcher<S, P, L>
where
    S: SessionStore + 'static,
    P: Presenter + 'static,
    L: Ledger + 'static,
{
    catalog: Arc<CategoryCatalog>,
    store: Arc<S>,
    presenter: Arc<P>,
    ledger: Arc<L>,
    retry: RetryPolicy,
    /// One FIFO lock per user with an event in flight
    lanes: Mutex<HashMap<String, Lane>>,
}

impl<S, P, L> Dispatcher<S, P, L>
where
    S: SessionStore + 'static,
    P: Presenter + 'static,
    L: Ledger + 'static,
{
    pub fn new(catalog: Arc<CategoryCatalog>, store: S, presenter: P, ledger: L) -> Self {
        Self {
            catalog,
            store: Arc::new(store),
            presenter: Arc::new(presenter),
            ledger: Arc::new(ledger),
            retry: RetryPolicy::default(),
            lanes: Mutex::new(HashMap::new()),
        }
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn catalog(&self) -> &Arc<CategoryCatalog> {
        &self.catalog
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    pub fn presenter(&self) -> &Arc<P> {
        &self.presenter
    }

    pub fn ledger(&self) -> &Arc<L> {
        &self.ledger
    }

    /// Apply one raw inbound event.
    ///
    /// Only infrastructure faults are returned as errors. Unless the ledger
    /// write already succeeded, an error leaves the session as it was before
    /// the event, so redelivering the event replays it.
    pub async fn dispatch(&self, inbound: InboundEvent) -> Result<DispatchOutcome, DispatchError> {
        let user_id = inbound.user_id();
        let Some(event) = inbound.decode() else {
            return Ok(DispatchOutcome::Ignored);
        };

        let lane = self.acquire_lane(user_id);
        let result = {
            let _turn = lane.lock().await;
            self.apply(user_id, event).await
        };
        self.release_lane(user_id, lane);

        match &result {
            Ok(DispatchOutcome::Handled { state }) => {
                tracing::debug!(user_id = %user_id, session = state.name(), "Event handled");
            }
            Ok(DispatchOutcome::Ignored) => {}
            Err(e) => {
                tracing::error!(
                    user_id = %user_id,
                    error = %e,
                    "Dropping event after infrastructure failure"
                );
            }
        }
        result
    }

    async fn apply(&self, user_id: &str, event: Event) -> Result<DispatchOutcome, DispatchError> {
        let state = self.store.get(user_id).await?.unwrap_or_default();
        let context = DialogueContext::new(user_id, self.catalog.clone());
        let event_kind = event.kind();

        let result = transition(&state, &context, event);

        tracing::debug!(
            user_id = %user_id,
            event = event_kind,
            from = state.name(),
            to = result.new_state.name(),
            operation = ?result.new_state.operation_type(),
            amount = ?result.new_state.amount(),
            effects = result.effects.len(),
            "transition"
        );

        if result.is_ignored() {
            return Ok(DispatchOutcome::Ignored);
        }

        // Once the ledger has the entry the dialogue is done, whatever the
        // presenter does
        let records = result
            .effects
            .iter()
            .any(|e| matches!(e, Effect::Record { .. }));
        let changed = result.new_state != state;

        for effect in result.effects {
            let presentation = effect.is_presentation();
            if let Err(e) = self
                .execute_effect(user_id, &result.new_state, effect)
                .await
            {
                if presentation && changed && !records {
                    self.restore_session(user_id, &state).await;
                }
                return Err(e);
            }
        }

        Ok(DispatchOutcome::Handled {
            state: result.new_state,
        })
    }

    async fn execute_effect(
        &self,
        user_id: &str,
        new_state: &DialogueState,
        effect: Effect,
    ) -> Result<(), DispatchError> {
        match effect {
            Effect::Record { transaction } => self.record(transaction).await,

            Effect::PersistSession => {
                if new_state.is_idle() {
                    self.store.clear(user_id).await?;
                } else {
                    self.store.put(user_id, new_state).await?;
                }
                Ok(())
            }

            Effect::ShowMainMenu => Ok(self.presenter.show_main_menu(user_id).await?),

            Effect::Prompt { text } => Ok(self.presenter.prompt(user_id, &text).await?),

            Effect::ShowCategories {
                operation_type,
                labels,
            } => Ok(self
                .presenter
                .show_categories(user_id, operation_type, &labels)
                .await?),

            Effect::Confirm {
                amount,
                operation_type,
                category,
            } => Ok(self
                .presenter
                .confirm(user_id, amount, operation_type, &category)
                .await?),
        }
    }

    /// Put back the session an event started from after its output could not
    /// be delivered
    async fn restore_session(&self, user_id: &str, previous: &DialogueState) {
        let restored = if previous.is_idle() {
            self.store.clear(user_id).await
        } else {
            self.store.put(user_id, previous).await
        };
        match restored {
            Ok(()) => {
                tracing::warn!(
                    user_id = %user_id,
                    session = previous.name(),
                    "Presenter failed, session rolled back"
                );
            }
            Err(e) => {
                tracing::error!(
                    user_id = %user_id,
                    error = %e,
                    "Presenter failed and session rollback failed"
                );
            }
        }
    }

    /// Write to the ledger, retrying with backoff. The id comes from the
    /// dialogue, so neither a retry nor a second tap on the same category
    /// can duplicate the entry.
    async fn record(&self, recorded: RecordedTransaction) -> Result<(), DispatchError> {
        let transaction = Transaction {
            id: recorded.entry_id.to_string(),
            user_id: recorded.user_id,
            operation_type: recorded.operation_type,
            amount: recorded.amount,
            category: recorded.category,
            recorded_at: Utc::now(),
        };

        let mut attempt = 1;
        loop {
            match self.ledger.record(&transaction).await {
                Ok(()) => {
                    tracing::info!(
                        user_id = %transaction.user_id,
                        transaction_id = %transaction.id,
                        operation = %transaction.operation_type,
                        amount = transaction.amount,
                        category = %transaction.category,
                        "Transaction recorded"
                    );
                    return Ok(());
                }
                Err(e) if attempt < self.retry.max_attempts => {
                    let delay = self.retry.delay(attempt);
                    tracing::warn!(
                        user_id = %transaction.user_id,
                        attempt,
                        delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                        error = %e,
                        "Ledger write failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(source) => {
                    return Err(DispatchError::Ledger {
                        attempts: attempt,
                        source,
                    });
                }
            }
        }
    }

    fn acquire_lane(&self, user_id: &str) -> Lane {
        let mut lanes = self.lanes.lock().unwrap_or_else(PoisonError::into_inner);
        lanes.entry(user_id.to_string()).or_default().clone()
    }

    /// Drop the lane once nobody else is queued on it
    fn release_lane(&self, user_id: &str, lane: Lane) {
        let mut lanes = self.lanes.lock().unwrap_or_else(PoisonError::into_inner);
        drop(lane);
        if lanes
            .get(user_id)
            .is_some_and(|lane| Arc::strong_count(lane) == 1)
        {
            lanes.remove(user_id);
        }
    }

    #[cfg(test)]
    pub(crate) fn lane_count(&self) -> usize {
        self.lanes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

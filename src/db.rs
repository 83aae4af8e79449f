//! Database module
//!
//! SQLite persistence for dialogue sessions and recorded transactions.

mod schema;

pub use schema::*;

use crate::state_machine::{DialogueState, OperationType};
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DbError {
    #[error("Database error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("Corrupt session state: {0}")]
    CorruptState(#[from] serde_json::Error),
    #[error("Corrupt row: {0}")]
    CorruptRow(String),
    #[error("Amount out of range: {0}")]
    AmountOutOfRange(u64),
    #[error("Database lock poisoned")]
    Poisoned,
}

pub type DbResult<T> = Result<T, DbError>;

/// Thread-safe database handle
#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    /// Open or create database at the given path
    pub fn open<P: AsRef<Path>>(path: P) -> DbResult<Self> {
        let conn = Connection::open(path)?;
        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        db.run_migrations()?;
        Ok(db)
    }

    /// Open an in-memory database
    #[allow(dead_code)] // Used in tests
    pub fn open_in_memory() -> DbResult<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        db.run_migrations()?;
        Ok(db)
    }

    fn lock(&self) -> DbResult<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| DbError::Poisoned)
    }

    fn run_migrations(&self) -> DbResult<()> {
        let conn = self.lock()?;
        conn.execute_batch(SCHEMA)?;
        Ok(())
    }

    // ==================== Session Operations ====================

    /// Load the stored dialogue state for a user
    pub fn get_session(&self, user_id: &str) -> DbResult<Option<DialogueState>> {
        let conn = self.lock()?;
        let raw: Option<String> = conn
            .query_row(
                "SELECT state FROM sessions WHERE user_id = ?1",
                params![user_id],
                |row| row.get(0),
            )
            .optional()?;
        drop(conn);

        raw.map(|json| serde_json::from_str(&json).map_err(DbError::from))
            .transpose()
    }

    /// Insert or overwrite the session for a user
    pub fn put_session(&self, user_id: &str, state: &DialogueState) -> DbResult<()> {
        let json = serde_json::to_string(state)?;
        let now = timestamp(Utc::now());
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO sessions (user_id, state, updated_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(user_id) DO UPDATE SET state = excluded.state, updated_at = excluded.updated_at",
            params![user_id, json, now],
        )?;
        Ok(())
    }

    /// Remove the session for a user (no-op when absent)
    pub fn clear_session(&self, user_id: &str) -> DbResult<()> {
        let conn = self.lock()?;
        conn.execute("DELETE FROM sessions WHERE user_id = ?1", params![user_id])?;
        Ok(())
    }

    // ==================== Transaction Operations ====================

    /// Append a transaction to the ledger. Re-inserting an existing id is a no-op.
    pub fn insert_transaction(&self, tx: &Transaction) -> DbResult<()> {
        let amount = i64::try_from(tx.amount).map_err(|_| DbError::AmountOutOfRange(tx.amount))?;
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO transactions (id, user_id, operation_type, amount, category, recorded_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)
             ON CONFLICT(id) DO NOTHING",
            params![
                tx.id,
                tx.user_id,
                tx.operation_type.as_str(),
                amount,
                tx.category,
                timestamp(tx.recorded_at),
            ],
        )?;
        Ok(())
    }

    /// All transactions of a user, newest first
    pub fn list_transactions(&self, user_id: &str) -> DbResult<Vec<Transaction>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT id, user_id, operation_type, amount, category, recorded_at
             FROM transactions WHERE user_id = ?1
             ORDER BY recorded_at DESC, rowid DESC",
        )?;
        let rows = stmt.query_map(params![user_id], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, i64>(3)?,
                row.get::<_, String>(4)?,
                row.get::<_, String>(5)?,
            ))
        })?;

        let mut transactions = Vec::new();
        for row in rows {
            let (id, user_id, operation_type, amount, category, recorded_at) = row?;
            transactions.push(Transaction {
                id,
                user_id,
                operation_type: operation_type
                    .parse::<OperationType>()
                    .map_err(|e| DbError::CorruptRow(e.to_string()))?,
                amount: u64::try_from(amount)
                    .map_err(|_| DbError::CorruptRow(format!("negative amount {amount}")))?,
                category,
                recorded_at: parse_datetime(&recorded_at)?,
            });
        }
        Ok(transactions)
    }
}

/// Fixed-width so lexical order matches time order
fn timestamp(dt: DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_datetime(s: &str) -> DbResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| DbError::CorruptRow(format!("bad timestamp {s}: {e}")))
}

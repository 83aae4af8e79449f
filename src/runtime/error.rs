//! Runtime error types
//!
//! Only infrastructure faults live here. Bad user input is absorbed by the
//! state machine and never becomes an error.

use crate::db::DbError;
use thiserror::Error;

/// Session store failure
#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Db(#[from] DbError),
    #[error("Session store unavailable: {0}")]
    Unavailable(String),
}

/// Ledger failure
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error(transparent)]
    Db(#[from] DbError),
    #[error("Ledger unavailable: {0}")]
    Unavailable(String),
}

/// Outbound presenter failure
#[derive(Debug, Error)]
pub enum PresentError {
    #[error("Presenter unavailable: {0}")]
    Unavailable(String),
}

/// Failure to apply an inbound event
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("Session store failure: {0}")]
    Store(#[from] StoreError),
    #[error("Failed to record transaction after {attempts} attempt(s): {source}")]
    Ledger {
        attempts: u32,
        #[source]
        source: LedgerError,
    },
    #[error("Presenter failure: {0}")]
    Present(#[from] PresentError),
}

//! API request and response types

use crate::db::Transaction;
use crate::state_machine::DialogueState;
use serde::Serialize;

/// Response for an inbound update
#[derive(Debug, Serialize)]
pub struct UpdateResponse {
    /// False when the update was undecodable or did not apply
    pub handled: bool,
}

/// Current dialogue position of a user
#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub user_id: String,
    pub session: DialogueState,
}

/// Ledger rows of a user, newest first
#[derive(Debug, Serialize)]
pub struct TransactionListResponse {
    pub transactions: Vec<Transaction>,
}

/// Error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
        }
    }
}

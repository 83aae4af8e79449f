//! Dialogue state types

use crate::catalog::CategoryCatalog;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use uuid::Uuid;

// ============================================================================
// Operation Type
// ============================================================================

/// The two kinds of transaction a user can record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationType {
    Income,
    Expense,
}

impl OperationType {
    pub const ALL: [OperationType; 2] = [OperationType::Income, OperationType::Expense];

    /// Wire name, used in callback tokens and storage
    pub fn as_str(self) -> &'static str {
        match self {
            OperationType::Income => "income",
            OperationType::Expense => "expense",
        }
    }
}

impl fmt::Display for OperationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unknown operation name
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown operation type: {0}")]
pub struct UnknownOperation(pub String);

impl FromStr for OperationType {
    type Err = UnknownOperation;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "income" => Ok(OperationType::Income),
            "expense" => Ok(OperationType::Expense),
            other => Err(UnknownOperation(other.to_string())),
        }
    }
}

// ============================================================================
// Dialogue State
// ============================================================================

/// Position of a user in the recording dialogue, together with the data
/// collected so far. This is the value the session store keeps per user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DialogueState {
    /// Main menu shown, nothing collected
    #[default]
    Idle,

    /// Operation chosen, waiting for the amount text
    AwaitingAmount { operation_type: OperationType },

    /// Amount accepted, waiting for a category button
    AwaitingCategory {
        operation_type: OperationType,
        amount: u64,
        /// Ledger id of the entry this dialogue records. Fixed when the
        /// amount is accepted, so tapping a category twice writes one row.
        #[serde(default = "Uuid::new_v4")]
        entry_id: Uuid,
    },
}

impl DialogueState {
    /// Stable name for logs and API responses
    pub fn name(&self) -> &'static str {
        match self {
            DialogueState::Idle => "idle",
            DialogueState::AwaitingAmount { .. } => "awaiting_amount",
            DialogueState::AwaitingCategory { .. } => "awaiting_category",
        }
    }

    pub fn operation_type(&self) -> Option<OperationType> {
        match self {
            DialogueState::Idle => None,
            DialogueState::AwaitingAmount { operation_type }
            | DialogueState::AwaitingCategory { operation_type, .. } => Some(*operation_type),
        }
    }

    pub fn amount(&self) -> Option<u64> {
        match self {
            DialogueState::AwaitingCategory { amount, .. } => Some(*amount),
            _ => None,
        }
    }

    /// Reset sessions are cleared from the store rather than written
    pub fn is_idle(&self) -> bool {
        matches!(self, DialogueState::Idle)
    }
}

// ============================================================================
// Context
// ============================================================================

/// Immutable inputs to a transition besides the session itself
#[derive(Debug, Clone)]
pub struct DialogueContext {
    pub user_id: String,
    pub catalog: Arc<CategoryCatalog>,
    /// Id given to a dialogue that reaches the category step
    pub entry_id: Uuid,
}

impl DialogueContext {
    pub fn new(user_id: impl Into<String>, catalog: Arc<CategoryCatalog>) -> Self {
        Self {
            user_id: user_id.into(),
            catalog,
            entry_id: Uuid::new_v4(),
        }
    }
}

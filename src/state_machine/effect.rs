//! Effects produced by state transitions

use super::state::OperationType;
use uuid::Uuid;

pub const ENTER_AMOUNT: &str = "Enter the amount:";
pub const AMOUNT_NOT_DIGITS: &str = "Please enter the amount using digits only.";

/// Transaction handed to the ledger when a dialogue completes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedTransaction {
    /// Stable ledger id; recording the same entry twice is a no-op
    pub entry_id: Uuid,
    pub user_id: String,
    pub operation_type: OperationType,
    pub amount: u64,
    pub category: String,
}

/// Effects to be executed after a state transition, in order
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Hand a completed transaction to the ledger
    Record { transaction: RecordedTransaction },

    /// Write the new dialogue state to the session store
    PersistSession,

    /// Show the two operation buttons
    ShowMainMenu,

    /// Plain text prompt
    Prompt { text: String },

    /// Show the category buttons for an operation, in catalog order
    ShowCategories {
        operation_type: OperationType,
        labels: Vec<String>,
    },

    /// Tell the user the transaction was recorded
    Confirm {
        amount: u64,
        operation_type: OperationType,
        category: String,
    },
}

impl Effect {
    pub fn prompt_amount() -> Self {
        Effect::Prompt {
            text: ENTER_AMOUNT.to_string(),
        }
    }

    pub fn amount_not_digits() -> Self {
        Effect::Prompt {
            text: AMOUNT_NOT_DIGITS.to_string(),
        }
    }

    pub fn record(transaction: RecordedTransaction) -> Self {
        Effect::Record { transaction }
    }

    pub fn confirm(transaction: &RecordedTransaction) -> Self {
        Effect::Confirm {
            amount: transaction.amount,
            operation_type: transaction.operation_type,
            category: transaction.category.clone(),
        }
    }

    /// Effects that only change what the user sees
    pub fn is_presentation(&self) -> bool {
        matches!(
            self,
            Effect::ShowMainMenu
                | Effect::Prompt { .. }
                | Effect::ShowCategories { .. }
                | Effect::Confirm { .. }
        )
    }
}

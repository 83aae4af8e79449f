//! Events that can occur in a dialogue

use super::state::OperationType;

/// Normalized user actions that trigger state transitions
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// `/start`: unconditional reset to the main menu
    Start,

    /// Main-menu button pressed
    OperationChosen { operation_type: OperationType },

    /// Free text, only meaningful while an amount is expected
    AmountText { text: String },

    /// Inline category button pressed; carries the operation the button
    /// list was generated for
    CategoryChosen {
        operation_type: OperationType,
        label: String,
    },
}

impl Event {
    /// Short name for logging
    pub fn kind(&self) -> &'static str {
        match self {
            Event::Start => "start",
            Event::OperationChosen { .. } => "operation_chosen",
            Event::AmountText { .. } => "amount_text",
            Event::CategoryChosen { .. } => "category_chosen",
        }
    }
}

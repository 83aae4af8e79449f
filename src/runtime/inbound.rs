//! Inbound event adapter
//!
//! Normalizes raw platform events into state machine events. Undecodable
//! input yields `None` and is dropped without an error.

use crate::callback;
use crate::presenter::operation_for_button;
use crate::state_machine::Event;
use serde::Deserialize;

const START_COMMAND: &str = "/start";

/// Raw event as delivered by the chat transport
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum InboundEvent {
    /// Free-text message (includes reply-keyboard button presses)
    Message { user_id: String, text: String },
    /// Inline button press carrying a callback token
    Callback { user_id: String, data: String },
}

impl InboundEvent {
    pub fn user_id(&self) -> &str {
        match self {
            InboundEvent::Message { user_id, .. } | InboundEvent::Callback { user_id, .. } => {
                user_id
            }
        }
    }

    /// Map to a transition event
    pub fn decode(&self) -> Option<Event> {
        match self {
            InboundEvent::Message { text, .. } => Some(decode_text(text)),
            InboundEvent::Callback { user_id, data } => match callback::decode(data) {
                Ok((operation_type, label)) => Some(Event::CategoryChosen {
                    operation_type,
                    label,
                }),
                Err(e) => {
                    tracing::debug!(
                        user_id = %user_id,
                        error = %e,
                        "Dropping malformed callback token"
                    );
                    None
                }
            },
        }
    }
}

/// Commands and buttons tolerate surrounding whitespace; amounts are passed
/// through untouched and must be digits only
fn decode_text(text: &str) -> Event {
    let command = text.trim();
    if is_start_command(command) {
        Event::Start
    } else if let Some(operation_type) = operation_for_button(command) {
        Event::OperationChosen { operation_type }
    } else {
        Event::AmountText {
            text: text.to_string(),
        }
    }
}

/// `/start`, `/start@botname`, or `/start payload`
fn is_start_command(text: &str) -> bool {
    let command = text.split_whitespace().next().unwrap_or_default();
    let command = command.split_once('@').map_or(command, |(name, _)| name);
    command == START_COMMAND
}

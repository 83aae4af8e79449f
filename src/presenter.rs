//! Outbound presenter
//!
//! Renders presentation effects into chat messages with keyboards and
//! publishes them for the transport to deliver.

use crate::callback;
use crate::runtime::{PresentError, Presenter};
use crate::state_machine::OperationType;
use async_trait::async_trait;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{broadcast, RwLock};

pub const INCOME_BUTTON: &str = "Add income 💰";
pub const EXPENSE_BUTTON: &str = "Add expense 📉";
pub const MAIN_MENU_TEXT: &str = "Choose an action:";

/// Operation and category buttons are laid out two per row
pub const BUTTONS_PER_ROW: usize = 2;

/// Main-menu button label for an operation
pub fn menu_button(operation_type: OperationType) -> &'static str {
    match operation_type {
        OperationType::Income => INCOME_BUTTON,
        OperationType::Expense => EXPENSE_BUTTON,
    }
}

/// Reverse of `menu_button`: which operation a typed or tapped label selects
pub fn operation_for_button(text: &str) -> Option<OperationType> {
    OperationType::ALL
        .into_iter()
        .find(|op| menu_button(*op) == text)
}

// ============================================================================
// Message Types
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Button {
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub callback_data: Option<String>,
}

impl Button {
    fn reply(text: &str) -> Self {
        Self {
            text: text.to_string(),
            callback_data: None,
        }
    }

    fn callback(text: &str, data: String) -> Self {
        Self {
            text: text.to_string(),
            callback_data: Some(data),
        }
    }
}

/// Keyboard attached to an outbound message
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Keyboard {
    /// Persistent buttons that send their label as text
    Reply { rows: Vec<Vec<Button>> },
    /// Buttons attached to the message that send a callback token
    Inline { rows: Vec<Vec<Button>> },
    /// Hide a previously shown reply keyboard
    Remove,
    /// Edit the user's last inline-keyboard message into this one, dropping
    /// its buttons
    ReplaceInline,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutboundMessage {
    pub user_id: String,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keyboard: Option<Keyboard>,
}

fn into_rows(buttons: Vec<Button>) -> Vec<Vec<Button>> {
    buttons
        .chunks(BUTTONS_PER_ROW)
        .map(<[Button]>::to_vec)
        .collect()
}

fn operation_noun(operation_type: OperationType) -> &'static str {
    match operation_type {
        OperationType::Income => "income",
        OperationType::Expense => "expense",
    }
}

// ============================================================================
// Rendering
// ============================================================================

pub fn render_main_menu(user_id: &str) -> OutboundMessage {
    let buttons = OperationType::ALL
        .into_iter()
        .map(|op| Button::reply(menu_button(op)))
        .collect();
    OutboundMessage {
        user_id: user_id.to_string(),
        text: MAIN_MENU_TEXT.to_string(),
        keyboard: Some(Keyboard::Reply {
            rows: into_rows(buttons),
        }),
    }
}

pub fn render_prompt(user_id: &str, text: &str) -> OutboundMessage {
    OutboundMessage {
        user_id: user_id.to_string(),
        text: text.to_string(),
        keyboard: Some(Keyboard::Remove),
    }
}

pub fn render_categories(
    user_id: &str,
    operation_type: OperationType,
    labels: &[String],
) -> OutboundMessage {
    let buttons = labels
        .iter()
        .map(|label| Button::callback(label, callback::encode(operation_type, label)))
        .collect();
    OutboundMessage {
        user_id: user_id.to_string(),
        text: format!("Choose the {} category:", operation_noun(operation_type)),
        keyboard: Some(Keyboard::Inline {
            rows: into_rows(buttons),
        }),
    }
}

pub fn render_confirmation(
    user_id: &str,
    amount: u64,
    operation_type: OperationType,
    category: &str,
) -> OutboundMessage {
    let kind = match operation_type {
        OperationType::Income => "Income",
        OperationType::Expense => "Expense",
    };
    OutboundMessage {
        user_id: user_id.to_string(),
        text: format!("✅ {kind} of {amount} recorded under '{category}'."),
        keyboard: Some(Keyboard::ReplaceInline),
    }
}

// ============================================================================
// Broadcast Presenter
// ============================================================================

/// Publishes rendered messages on one broadcast channel per user, so a slow
/// stream only ever lags on its own user's traffic
#[derive(Clone)]
pub struct BroadcastPresenter {
    capacity: usize,
    /// Channels of users with an open stream
    channels: Arc<RwLock<HashMap<String, broadcast::Sender<OutboundMessage>>>>,
}

impl BroadcastPresenter {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            channels: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Receive everything presented to one user from now on
    pub async fn subscribe(&self, user_id: &str) -> broadcast::Receiver<OutboundMessage> {
        let mut channels = self.channels.write().await;
        channels
            .entry(user_id.to_string())
            .or_insert_with(|| broadcast::channel(self.capacity).0)
            .subscribe()
    }

    async fn publish(&self, message: OutboundMessage) {
        let user_id = message.user_id.clone();
        let sent = match self.channels.read().await.get(&user_id) {
            Some(tx) => tx.send(message).is_ok(),
            None => false,
        };

        // The user has no open stream; the session remains the source of truth
        if !sent {
            tracing::debug!(user_id = %user_id, "No outbound stream, message dropped");
            self.prune(&user_id).await;
        }
    }

    /// Forget a user's channel once every stream on it has closed
    async fn prune(&self, user_id: &str) {
        let mut channels = self.channels.write().await;
        if channels
            .get(user_id)
            .is_some_and(|tx| tx.receiver_count() == 0)
        {
            channels.remove(user_id);
        }
    }

    #[cfg(test)]
    async fn channel_count(&self) -> usize {
        self.channels.read().await.len()
    }
}

#[async_trait]
impl Presenter for BroadcastPresenter {
    async fn show_main_menu(&self, user_id: &str) -> Result<(), PresentError> {
        self.publish(render_main_menu(user_id)).await;
        Ok(())
    }

    async fn prompt(&self, user_id: &str, text: &str) -> Result<(), PresentError> {
        self.publish(render_prompt(user_id, text)).await;
        Ok(())
    }

    async fn show_categories(
        &self,
        user_id: &str,
        operation_type: OperationType,
        labels: &[String],
    ) -> Result<(), PresentError> {
        self.publish(render_categories(user_id, operation_type, labels)).await;
        Ok(())
    }

    async fn confirm(
        &self,
        user_id: &str,
        amount: u64,
        operation_type: OperationType,
        category: &str,
    ) -> Result<(), PresentError> {
        self.publish(render_confirmation(
            user_id,
            amount,
            operation_type,
            category,
        ))
        .await;
        Ok(())
    }
}

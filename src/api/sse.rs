//! Server-Sent Events support
//!
//! One stream per user, fed by that user's own broadcast channel.

use crate::presenter::OutboundMessage;
use crate::state_machine::DialogueState;
use axum::response::sse::{Event, KeepAlive, Sse};
use futures::stream::Stream;
use serde_json::json;
use std::convert::Infallible;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt;

/// Convert a user's outbound channel into an SSE stream, starting
/// with an `init` event carrying the current session
pub fn sse_stream(
    user_id: String,
    session: DialogueState,
    broadcast_rx: broadcast::Receiver<OutboundMessage>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let init = json!({ "type": "init", "session": session });
    let init = futures::stream::once(async move {
        Ok(Event::default().event("init").data(init.to_string()))
    });

    let messages = BroadcastStream::new(broadcast_rx).filter_map(move |result| match result {
        Ok(message) => message_event(&message).map(Ok),
        Err(e) => {
            tracing::warn!(
                user_id = %user_id,
                error = %e,
                "Outbound stream lagged, messages skipped"
            );
            None
        }
    });

    Sse::new(init.chain(messages)).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("ping"),
    )
}

fn message_event(message: &OutboundMessage) -> Option<Event> {
    match serde_json::to_string(message) {
        Ok(data) => Some(Event::default().event("message").data(data)),
        Err(e) => {
            tracing::error!(
                user_id = %message.user_id,
                error = %e,
                "Failed to serialize outbound message"
            );
            None
        }
    }
}

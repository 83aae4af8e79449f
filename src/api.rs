//! HTTP API for the ledger bot
//!
//! Inbound chat updates arrive as webhook posts; outbound messages leave
//! through a per-user SSE stream.

mod handlers;
mod sse;
mod types;

pub use handlers::create_router;

use crate::runtime::ProductionDispatcher;
use std::sync::Arc;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub dispatcher: Arc<ProductionDispatcher>,
}

impl AppState {
    pub fn new(dispatcher: ProductionDispatcher) -> Self {
        Self {
            dispatcher: Arc::new(dispatcher),
        }
    }
}

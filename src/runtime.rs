//! Runtime for executing dialogue transitions
//!
//! Decodes inbound events, serializes them per user, and carries out the
//! effects the state machine returns against the session store, the ledger
//! and the presenter.

mod dispatcher;
mod error;
mod inbound;
pub mod traits;


pub use dispatcher::{DispatchOutcome, Dispatcher, RetryPolicy};
pub use error::{DispatchError, LedgerError, PresentError, StoreError};
pub use inbound::InboundEvent;
pub use traits::*;

use crate::presenter::BroadcastPresenter;
use std::sync::Arc;

/// Dispatcher wired to production adapters. The session store is chosen at
/// startup, so it stays a trait object.
pub type ProductionDispatcher =
    Dispatcher<Arc<dyn SessionStore>, BroadcastPresenter, DatabaseStorage>;

//! Dialogue state machine
//!
//! Elm-style pure transitions: `(state, context, event) -> (state, effects)`.
//! The runtime owns all I/O and executes the returned effects.

pub mod effect;
pub mod event;
pub mod state;
pub(crate) mod transition;

#[cfg(test)]
mod proptests;

pub use effect::{Effect, RecordedTransaction};
pub use event::Event;
pub use state::{DialogueContext, DialogueState, OperationType};
pub use transition::transition;

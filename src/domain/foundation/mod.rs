//! Foundation module - Shared domain primitives.
//!
//! Identifiers and the state machine trait shared by the relay and the
//! resilience client.

mod ids;
mod state_machine;

pub use ids::ViewerId;
pub use state_machine::{InvalidTransition, StateMachine};

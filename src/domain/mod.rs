//! Domain layer containing the relay's value types.
//!
//! # Module Organization
//!
//! - `foundation` - Shared primitives (identifiers, state machine trait)
//! - `telemetry` - Device records and the derived snapshot

pub mod foundation;
pub mod telemetry;

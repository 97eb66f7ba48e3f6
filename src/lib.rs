//! Metro Relay - live metro telemetry for dashboards
//!
//! Subscribes to a device's telemetry topic on an MQTT broker, folds each
//! record into a single current snapshot, and pushes that snapshot to every
//! connected dashboard over WebSocket. The `client` module is the
//! dashboard-side counterpart: a connection manager with automatic
//! reconnection and a bounded give-up timer.

pub mod adapters;
pub mod application;
pub mod client;
pub mod config;
pub mod domain;
pub mod ports;

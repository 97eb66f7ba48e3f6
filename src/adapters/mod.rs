//! Adapters - Implementations of port interfaces.
//!
//! Adapters connect the core to external systems:
//! - `mqtt` - Telemetry subscription on the broker
//! - `storage` - The current snapshot
//! - `websocket` - Viewer sessions and broadcast fanout

pub mod mqtt;
pub mod storage;
pub mod websocket;

pub use mqtt::{BrokerError, MqttTelemetrySubscriber};
pub use storage::SnapshotStore;
pub use websocket::{relay_router, RelayState, ViewerRegistry};

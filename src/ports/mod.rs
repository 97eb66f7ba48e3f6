//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the core and the outside world. Adapters implement these ports.
//!
//! - `SnapshotPublisher` - Fan a snapshot out to connected viewers
//! - `Transport` - Open one physical connection to the relay (client side)

mod snapshot_publisher;
mod transport;

pub use snapshot_publisher::SnapshotPublisher;
pub use transport::{FrameStream, Transport, TransportError};

//! Resilient dashboard client.
//!
//! Connects to the relay's `/ws` endpoint, reconnects on its own with a
//! fixed delay, and gives up when no connection is established within a
//! bounded time. Consumers subscribe once and keep receiving events across
//! every connection object the client creates.
//!
//! ```no_run
//! use std::sync::Arc;
//! use tokio::sync::broadcast::error::RecvError;
//! use metro_relay::client::{ClientOptions, ResilientClient, TungsteniteTransport};
//!
//! # async fn demo() -> Result<(), metro_relay::client::ClientError> {
//! let transport = Arc::new(TungsteniteTransport::new("ws://localhost:3001/ws"));
//! let client = ResilientClient::spawn(ClientOptions::default(), transport);
//! let mut events = client.subscribe();
//! client.connect_socket()?;
//! loop {
//!     match events.recv().await {
//!         Ok(event) => println!("{:?}", event),
//!         // A slow listener skips events but stays subscribed
//!         Err(RecvError::Lagged(skipped)) => eprintln!("missed {} events", skipped),
//!         Err(RecvError::Closed) => break,
//!     }
//! }
//! # Ok(())
//! # }
//! ```

mod connection;
mod driver;
mod state;
mod tungstenite_transport;
mod view;

pub use driver::{ClientOptions, ResilientClient};
pub use state::ConnectionState;
pub use tungstenite_transport::TungsteniteTransport;
pub use view::ViewState;

use thiserror::Error;

use crate::domain::telemetry::Snapshot;

/// Events delivered to client listeners.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientEvent {
    /// A new connection object was created.
    ConnectionCreated { generation: u64 },
    Connected,
    /// The connection dropped; it is reconnecting on its own.
    Disconnected { reason: String },
    /// A snapshot arrived from the relay.
    Update(Snapshot),
    /// No connection within the give-up timeout; the connection object
    /// has been torn down.
    GaveUp,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ClientError {
    #[error("Client event loop has stopped")]
    Stopped,
}

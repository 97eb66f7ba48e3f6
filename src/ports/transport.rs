//! Transport port - Interface for opening one physical relay connection.
//!
//! The resilience client owns reconnection, give-up and listener forwarding;
//! a transport only knows how to open a single connection and stream the
//! text frames it receives. Production uses a WebSocket transport, tests use
//! scripted in-memory transports.

use async_trait::async_trait;
use futures::stream::BoxStream;

/// Stream of inbound text frames from one open connection.
///
/// The stream ends when the peer closes the connection; an `Err` item means
/// the connection broke.
pub type FrameStream = BoxStream<'static, Result<String, TransportError>>;

/// Errors raised by a transport.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    /// The handshake could not be completed.
    #[error("Connection to {endpoint} failed: {reason}")]
    Connect { endpoint: String, reason: String },

    /// An established connection broke while reading.
    #[error("Connection lost: {0}")]
    Receive(String),
}

/// Port for opening connections to the relay.
///
/// # Example
///
/// ```ignore
/// let frames = transport.open().await?;
/// while let Some(frame) = frames.next().await {
///     let text = frame?;
///     // decode server message...
/// }
/// ```
#[async_trait]
pub trait Transport: Send + Sync + 'static {
    /// Perform one connection handshake.
    async fn open(&self) -> Result<FrameStream, TransportError>;

    /// Where this transport connects to, for logging.
    fn endpoint(&self) -> &str;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[allow(dead_code)]
    fn assert_object_safe(_: &dyn Transport) {}

    #[test]
    fn connect_error_names_endpoint() {
        let err = TransportError::Connect {
            endpoint: "ws://relay:3001/ws".to_string(),
            reason: "refused".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Connection to ws://relay:3001/ws failed: refused"
        );
    }
}

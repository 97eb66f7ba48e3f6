//! WebSocket transport for the resilient client.

use async_trait::async_trait;
use futures::{future, StreamExt};
use tokio_tungstenite::{connect_async, tungstenite::Message};

use crate::ports::{FrameStream, Transport, TransportError};

/// Opens a WebSocket to the relay and yields its text frames.
pub struct TungsteniteTransport {
    url: String,
}

impl TungsteniteTransport {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }
}

#[async_trait]
impl Transport for TungsteniteTransport {
    async fn open(&self) -> Result<FrameStream, TransportError> {
        let (ws_stream, _response) =
            connect_async(self.url.as_str())
                .await
                .map_err(|e| TransportError::Connect {
                    endpoint: self.url.clone(),
                    reason: e.to_string(),
                })?;

        tracing::debug!(url = %self.url, "WebSocket handshake complete");

        let frames = ws_stream
            .take_while(|msg| future::ready(!matches!(msg, Ok(Message::Close(_)))))
            .filter_map(|msg| {
                future::ready(match msg {
                    Ok(Message::Text(text)) => Some(Ok(text)),
                    // Ping/pong are answered by tungstenite, binary is unused
                    Ok(_) => None,
                    Err(e) => Some(Err(TransportError::Receive(e.to_string()))),
                })
            })
            .boxed();

        Ok(frames)
    }

    fn endpoint(&self) -> &str {
        &self.url
    }
}

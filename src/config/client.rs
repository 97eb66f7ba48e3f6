//! Dashboard client configuration

use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;

/// Configuration for the resilient dashboard client
#[derive(Debug, Clone, Deserialize)]
pub struct ClientConfig {
    /// Relay WebSocket endpoint (`ws://` only)
    #[serde(default = "default_server_url")]
    pub server_url: String,

    /// Give up if not connected within this many milliseconds; zero or
    /// negative never gives up
    #[serde(default = "default_give_up_timeout")]
    pub give_up_timeout_ms: i64,

    /// Fixed delay between automatic reconnection attempts in milliseconds
    #[serde(default = "default_reconnection_delay")]
    pub reconnection_delay_ms: u64,
}

impl ClientConfig {
    /// Give-up duration, `None` when give-up is disabled
    pub fn give_up_timeout(&self) -> Option<Duration> {
        u64::try_from(self.give_up_timeout_ms)
            .ok()
            .filter(|ms| *ms > 0)
            .map(Duration::from_millis)
    }

    /// Get reconnection delay as Duration
    pub fn reconnection_delay(&self) -> Duration {
        Duration::from_millis(self.reconnection_delay_ms)
    }

    /// Validate client configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.server_url.is_empty() {
            return Err(ValidationError::MissingRequired("CLIENT_SERVER_URL"));
        }
        // The WebSocket client is built without TLS support.
        if self.server_url.starts_with("wss://") {
            return Err(ValidationError::TlsServerUrl(self.server_url.clone()));
        }
        if !self.server_url.starts_with("ws://") {
            return Err(ValidationError::InvalidServerUrl(self.server_url.clone()));
        }
        if self.reconnection_delay_ms == 0 {
            return Err(ValidationError::InvalidReconnectDelay);
        }
        Ok(())
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server_url: default_server_url(),
            give_up_timeout_ms: default_give_up_timeout(),
            reconnection_delay_ms: default_reconnection_delay(),
        }
    }
}

fn default_server_url() -> String {
    "ws://localhost:3001/ws".to_string()
}

fn default_give_up_timeout() -> i64 {
    10_000
}

fn default_reconnection_delay() -> u64 {
    1000
}

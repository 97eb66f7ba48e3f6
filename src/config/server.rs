//! Server configuration

use axum::http::HeaderValue;
use serde::Deserialize;
use std::net::SocketAddr;

use super::error::ValidationError;
use super::logging::LogFormat;

/// Server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host address to bind to
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to listen on
    #[serde(default = "default_port")]
    pub port: u16,

    /// The dashboard origin allowed to open viewer sessions
    #[serde(default = "default_allowed_origin")]
    pub allowed_origin: String,

    /// Rust log filter directive
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Log output format
    #[serde(default)]
    pub log_format: LogFormat,

    /// Per-viewer outbound queue capacity
    #[serde(default = "default_session_buffer")]
    pub session_buffer: usize,
}

impl ServerConfig {
    /// Get the socket address to bind to
    pub fn socket_addr(&self) -> Result<SocketAddr, ValidationError> {
        let addr = format!("{}:{}", self.host, self.port);
        addr.parse()
            .map_err(|_| ValidationError::InvalidBindAddress(addr))
    }

    /// Get the allowed origin as a header value
    pub fn allowed_origin_header(&self) -> Result<HeaderValue, ValidationError> {
        HeaderValue::from_str(&self.allowed_origin)
            .map_err(|_| ValidationError::InvalidOrigin(self.allowed_origin.clone()))
    }

    /// Validate server configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.port == 0 {
            return Err(ValidationError::InvalidPort);
        }
        self.socket_addr()?;

        if !self.allowed_origin.starts_with("http://") && !self.allowed_origin.starts_with("https://")
        {
            return Err(ValidationError::InvalidOrigin(self.allowed_origin.clone()));
        }
        self.allowed_origin_header()?;

        if self.session_buffer == 0 {
            return Err(ValidationError::InvalidSessionBuffer);
        }
        Ok(())
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            allowed_origin: default_allowed_origin(),
            log_level: default_log_level(),
            log_format: LogFormat::default(),
            session_buffer: default_session_buffer(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3001
}

fn default_allowed_origin() -> String {
    "http://localhost:5173".to_string()
}

fn default_log_level() -> String {
    "info,metro_relay=debug,rumqttc=warn".to_string()
}

fn default_session_buffer() -> usize {
    128
}

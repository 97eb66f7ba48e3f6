//! Configuration error types

use thiserror::Error;

/// Errors that can occur during configuration loading
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration loading failed: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Validation failed: {0}")]
    ValidationFailed(#[from] ValidationError),

    #[error("Invalid log filter: {0}")]
    InvalidLogFilter(#[from] tracing_subscriber::filter::ParseError),
}

/// Errors that can occur during configuration validation
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Required configuration missing: {0}")]
    MissingRequired(&'static str),

    #[error("Invalid port number")]
    InvalidPort,

    #[error("Invalid bind address: {0}")]
    InvalidBindAddress(String),

    #[error("Allowed origin must be an http(s) origin: {0}")]
    InvalidOrigin(String),

    #[error("Session buffer must be at least 1")]
    InvalidSessionBuffer,

    #[error("Invalid broker URL format: {0}")]
    InvalidBrokerUrl(String),

    #[error("Broker topic must not contain wildcards: {0}")]
    InvalidTopic(String),

    #[error("Broker password set without a username")]
    PasswordWithoutUsername,

    #[error("Reconnect delay must be greater than zero")]
    InvalidReconnectDelay,

    #[error("Keep-alive must be at least 5 seconds")]
    InvalidKeepAlive,

    #[error("Server URL must use ws://: {0}")]
    InvalidServerUrl(String),

    #[error("wss:// relay URLs need a TLS-enabled WebSocket client: {0}")]
    TlsServerUrl(String),
}

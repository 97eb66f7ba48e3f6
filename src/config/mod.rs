//! Application configuration module
//!
//! This module provides type-safe configuration loading from environment variables
//! using the `config` and `dotenvy` crates. Configuration is loaded with the
//! `METRO_RELAY` prefix and nested values use double underscores as separators.
//!
//! # Example
//!
//! ```no_run
//! use metro_relay::config::AppConfig;
//!
//! let config = AppConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//!
//! println!("Relay listening on {:?}", config.server.socket_addr());
//! ```

mod broker;
mod client;
mod error;
mod logging;
mod server;

pub use broker::BrokerConfig;
pub use client::ClientConfig;
pub use error::{ConfigError, ValidationError};
pub use logging::{init_logging, LogFormat};
pub use server::ServerConfig;

use serde::Deserialize;

/// Root application configuration
///
/// Every section has defaults, so an empty environment yields a relay on
/// port 3001 talking to a local broker.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Server configuration (bind address, allowed origin, logging)
    #[serde(default)]
    pub server: ServerConfig,

    /// MQTT broker configuration
    #[serde(default)]
    pub broker: BrokerConfig,

    /// Dashboard client configuration (used by `metro-watch`)
    #[serde(default)]
    pub client: ClientConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// This function:
    /// 1. Loads `.env` file if present (for development)
    /// 2. Reads environment variables with `METRO_RELAY` prefix
    /// 3. Uses `__` (double underscore) to separate nested values
    /// 4. Deserializes into typed configuration structs
    ///
    /// # Environment Variable Format
    ///
    /// - `METRO_RELAY__SERVER__PORT=3001` -> `server.port = 3001`
    /// - `METRO_RELAY__BROKER__URL=...` -> `broker.url = ...`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if values cannot be parsed into expected types.
    pub fn load() -> Result<Self, ConfigError> {
        // Load .env file if present (development)
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .prefix("METRO_RELAY")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Validate the sections the relay needs (server and broker)
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` if any configuration value is invalid.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.server.validate()?;
        self.broker.validate()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;
    use std::env;
    use std::sync::Mutex;

    // Mutex to ensure tests don't run in parallel (env vars are global)
    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    const VARS: &[&str] = &[
        "METRO_RELAY__SERVER__PORT",
        "METRO_RELAY__SERVER__ALLOWED_ORIGIN",
        "METRO_RELAY__SERVER__LOG_FORMAT",
        "METRO_RELAY__BROKER__URL",
        "METRO_RELAY__BROKER__USERNAME",
        "METRO_RELAY__BROKER__PASSWORD",
        "METRO_RELAY__BROKER__TOPIC",
        "METRO_RELAY__CLIENT__GIVE_UP_TIMEOUT_MS",
    ];

    /// Helper to clear environment variables after testing
    fn clear_env() {
        for var in VARS {
            env::remove_var(var);
        }
    }

    #[test]
    fn test_defaults_from_empty_environment() {
        let _guard = ENV_MUTEX.lock().unwrap();
        clear_env();
        let result = AppConfig::load();

        assert!(result.is_ok(), "Failed to load config: {:?}", result.err());
        let config = result.unwrap();
        assert_eq!(config.server.port, 3001);
        assert_eq!(config.broker.topic, "metro/state");
        assert_eq!(config.client.give_up_timeout_ms, 10_000);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_from_environment() {
        let _guard = ENV_MUTEX.lock().unwrap();
        env::set_var("METRO_RELAY__SERVER__PORT", "4000");
        env::set_var("METRO_RELAY__SERVER__ALLOWED_ORIGIN", "https://dash.example.com");
        env::set_var("METRO_RELAY__SERVER__LOG_FORMAT", "json");
        env::set_var("METRO_RELAY__BROKER__URL", "mqtts://broker.example.com:8883");
        env::set_var("METRO_RELAY__BROKER__USERNAME", "relay");
        env::set_var("METRO_RELAY__BROKER__PASSWORD", "s3cret");
        env::set_var("METRO_RELAY__BROKER__TOPIC", "line1/state");
        let result = AppConfig::load();
        clear_env();

        let config = result.unwrap();
        assert_eq!(config.server.port, 4000);
        assert_eq!(config.server.allowed_origin, "https://dash.example.com");
        assert_eq!(config.server.log_format, LogFormat::Json);
        assert_eq!(config.broker.url, "mqtts://broker.example.com:8883");
        assert_eq!(config.broker.username.as_deref(), Some("relay"));
        assert_eq!(
            config.broker.password.as_ref().map(|p| p.expose_secret().as_str()),
            Some("s3cret")
        );
        assert_eq!(config.broker.topic, "line1/state");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_negative_give_up_timeout() {
        let _guard = ENV_MUTEX.lock().unwrap();
        env::set_var("METRO_RELAY__CLIENT__GIVE_UP_TIMEOUT_MS", "-1");
        let result = AppConfig::load();
        clear_env();

        let config = result.unwrap();
        assert_eq!(config.client.give_up_timeout(), None);
    }

    #[test]
    fn test_validate_rejects_bad_broker_url() {
        let _guard = ENV_MUTEX.lock().unwrap();
        env::set_var("METRO_RELAY__BROKER__URL", "http://localhost:1883");
        let result = AppConfig::load();
        clear_env();

        let config = result.unwrap();
        assert!(matches!(
            config.validate(),
            Err(ValidationError::InvalidBrokerUrl(_))
        ));
    }
}

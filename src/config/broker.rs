//! MQTT broker configuration

use secrecy::SecretString;
use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;

/// MQTT broker configuration
#[derive(Debug, Clone, Deserialize)]
pub struct BrokerConfig {
    /// Broker URL (`mqtt://`, `mqtts://` or `tcp://`)
    #[serde(default = "default_url")]
    pub url: String,

    /// Broker username
    pub username: Option<String>,

    /// Broker password
    pub password: Option<SecretString>,

    /// Telemetry topic to subscribe to
    #[serde(default = "default_topic")]
    pub topic: String,

    /// MQTT client identifier
    #[serde(default = "default_client_id")]
    pub client_id: String,

    /// Delay between reconnection attempts in milliseconds
    #[serde(default = "default_reconnect_delay")]
    pub reconnect_delay_ms: u64,

    /// MQTT keep-alive interval in seconds
    #[serde(default = "default_keep_alive")]
    pub keep_alive_secs: u64,
}

impl BrokerConfig {
    /// Get reconnect delay as Duration
    pub fn reconnect_delay(&self) -> Duration {
        Duration::from_millis(self.reconnect_delay_ms)
    }

    /// Get keep-alive as Duration
    pub fn keep_alive(&self) -> Duration {
        Duration::from_secs(self.keep_alive_secs)
    }

    /// Validate broker configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.url.is_empty() {
            return Err(ValidationError::MissingRequired("BROKER_URL"));
        }
        if !["mqtt://", "mqtts://", "tcp://"]
            .iter()
            .any(|scheme| self.url.starts_with(scheme))
        {
            return Err(ValidationError::InvalidBrokerUrl(self.url.clone()));
        }
        if self.topic.is_empty() {
            return Err(ValidationError::MissingRequired("BROKER_TOPIC"));
        }
        if self.topic.contains(['#', '+']) {
            return Err(ValidationError::InvalidTopic(self.topic.clone()));
        }
        if self.client_id.is_empty() {
            return Err(ValidationError::MissingRequired("BROKER_CLIENT_ID"));
        }
        if self.password.is_some() && self.username.is_none() {
            return Err(ValidationError::PasswordWithoutUsername);
        }
        if self.reconnect_delay_ms == 0 {
            return Err(ValidationError::InvalidReconnectDelay);
        }
        if self.keep_alive_secs < 5 {
            return Err(ValidationError::InvalidKeepAlive);
        }
        Ok(())
    }
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            url: default_url(),
            username: None,
            password: None,
            topic: default_topic(),
            client_id: default_client_id(),
            reconnect_delay_ms: default_reconnect_delay(),
            keep_alive_secs: default_keep_alive(),
        }
    }
}

fn default_url() -> String {
    "mqtt://localhost:1883".to_string()
}

fn default_topic() -> String {
    "metro/state".to_string()
}

fn default_client_id() -> String {
    "metro-relay".to_string()
}

fn default_reconnect_delay() -> u64 {
    5000
}

fn default_keep_alive() -> u64 {
    30
}

//! MQTT telemetry subscriber.
//!
//! Owns the broker connection and feeds every publish on the telemetry topic
//! through the ingest handler, one message at a time.
//!
//! # Reconnection
//!
//! `rumqttc` reconnects on the next `poll()` after a connection error. The
//! subscriber waits `reconnect_delay` between attempts, forever, and
//! re-subscribes on every `ConnAck` since sessions are clean.

use std::sync::Arc;

use http::Uri;
use rumqttc::{AsyncClient, Event, EventLoop, MqttOptions, Packet, QoS, Transport};
use secrecy::ExposeSecret;
use thiserror::Error;
use tokio::sync::watch;

use crate::application::IngestTelemetryHandler;
use crate::config::BrokerConfig;

/// Capacity of the request channel between `AsyncClient` and `EventLoop`.
const REQUEST_CHANNEL_CAPACITY: usize = 10;

const DEFAULT_MQTT_PORT: u16 = 1883;
const DEFAULT_MQTTS_PORT: u16 = 8883;

/// Errors building the broker connection.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum BrokerError {
    #[error("Invalid broker URL: {0}")]
    InvalidUrl(String),

    #[error("Unsupported broker URL scheme: {0}")]
    UnsupportedScheme(String),
}

/// Subscribes to the telemetry topic and drives ingestion.
pub struct MqttTelemetrySubscriber {
    config: BrokerConfig,
    handler: Arc<IngestTelemetryHandler>,
}

impl MqttTelemetrySubscriber {
    pub fn new(config: BrokerConfig, handler: Arc<IngestTelemetryHandler>) -> Self {
        Self { config, handler }
    }

    /// Build the `rumqttc` options from the broker URL and credentials.
    pub fn mqtt_options(&self) -> Result<MqttOptions, BrokerError> {
        let uri: Uri = self
            .config
            .url
            .parse()
            .map_err(|_| BrokerError::InvalidUrl(self.config.url.clone()))?;

        let host = uri
            .host()
            .ok_or_else(|| BrokerError::InvalidUrl(self.config.url.clone()))?
            .to_string();

        let (tls, default_port) = match uri.scheme_str() {
            Some("mqtt") | Some("tcp") => (false, DEFAULT_MQTT_PORT),
            Some("mqtts") => (true, DEFAULT_MQTTS_PORT),
            other => {
                return Err(BrokerError::UnsupportedScheme(
                    other.unwrap_or_default().to_string(),
                ))
            }
        };
        let port = uri.port_u16().unwrap_or(default_port);

        let mut options = MqttOptions::new(self.config.client_id.clone(), host, port);
        options.set_keep_alive(self.config.keep_alive());
        options.set_clean_session(true);

        if let Some(username) = &self.config.username {
            let password = self
                .config
                .password
                .as_ref()
                .map(|p| p.expose_secret().clone())
                .unwrap_or_default();
            options.set_credentials(username.clone(), password);
        }

        if tls {
            options.set_transport(Transport::tls_with_default_config());
        }

        Ok(options)
    }

    /// Run the subscription loop until `shutdown` flips to true.
    ///
    /// Broker errors are logged and retried without limit; only an invalid
    /// broker URL ends the loop with an error.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) -> Result<(), BrokerError> {
        let options = self.mqtt_options()?;
        let (client, mut eventloop) = AsyncClient::new(options, REQUEST_CHANNEL_CAPACITY);

        tracing::info!(
            url = %self.config.url,
            topic = %self.config.topic,
            client_id = %self.config.client_id,
            "Connecting to telemetry broker"
        );

        loop {
            tokio::select! {
                // Check for shutdown signal
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        self.disconnect(&client, &mut eventloop).await;
                        return Ok(());
                    }
                }

                event = eventloop.poll() => match event {
                    Ok(Event::Incoming(Packet::ConnAck(_))) => {
                        tracing::info!(url = %self.config.url, "Connected to telemetry broker");
                        if let Err(e) = client.try_subscribe(self.config.topic.clone(), QoS::AtLeastOnce) {
                            tracing::warn!(topic = %self.config.topic, "Failed to queue subscription: {}", e);
                        }
                    }
                    Ok(Event::Incoming(Packet::SubAck(ack))) => {
                        tracing::info!(
                            topic = %self.config.topic,
                            return_codes = ?ack.return_codes,
                            "Subscribed to telemetry topic"
                        );
                    }
                    Ok(Event::Incoming(Packet::Publish(publish))) => {
                        self.dispatch(&publish.topic, &publish.payload).await;
                    }
                    Ok(_) => {}
                    Err(e) => {
                        tracing::warn!(
                            url = %self.config.url,
                            retry_in_ms = self.config.reconnect_delay_ms,
                            "Broker connection error: {}",
                            e
                        );

                        tokio::select! {
                            changed = shutdown.changed() => {
                                if changed.is_err() || *shutdown.borrow() {
                                    return Ok(());
                                }
                            }
                            _ = tokio::time::sleep(self.config.reconnect_delay()) => {}
                        }
                    }
                },
            }
        }
    }

    /// Feed one broker message through ingestion. Bad payloads are dropped.
    pub async fn dispatch(&self, topic: &str, payload: &[u8]) {
        if let Err(e) = self.handler.handle(topic, payload).await {
            tracing::warn!(topic = %topic, "Dropping telemetry message: {}", e);
        }
    }

    async fn disconnect(&self, client: &AsyncClient, eventloop: &mut EventLoop) {
        if client.try_disconnect().is_ok() {
            // Flush the DISCONNECT packet; a dead connection just errors out.
            let _ = tokio::time::timeout(std::time::Duration::from_secs(1), eventloop.poll()).await;
        }
        tracing::info!(url = %self.config.url, "Disconnected from telemetry broker");
    }
}

//! MQTT adapter - telemetry ingestion from the broker.

mod subscriber;

pub use subscriber::{BrokerError, MqttTelemetrySubscriber};

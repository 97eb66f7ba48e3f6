//! Application handlers.
//!
//! Handlers that orchestrate domain operations across ports.

pub mod ingest_telemetry;

pub use ingest_telemetry::{IngestError, IngestResult, IngestTelemetryHandler};

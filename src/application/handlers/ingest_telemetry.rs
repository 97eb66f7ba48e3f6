//! IngestTelemetryHandler - decode, apply and broadcast one broker payload.

use std::sync::Arc;

use thiserror::Error;

use crate::adapters::storage::SnapshotStore;
use crate::domain::telemetry::{DecodeError, EventKind, ProducerRecord, Snapshot};
use crate::ports::SnapshotPublisher;

/// Result of a successfully ingested payload.
#[derive(Debug, Clone)]
pub struct IngestResult {
    pub snapshot: Snapshot,
    pub event: EventKind,
    /// Number of viewers the snapshot was dispatched to.
    pub delivered: usize,
}

/// Why a payload was not ingested.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error(transparent)]
    Decode(#[from] DecodeError),
}

/// Handler for inbound telemetry payloads.
///
/// Must be driven by a single task: payloads are applied and broadcast one
/// at a time, in arrival order, so every viewer observes the same sequence
/// of snapshots.
pub struct IngestTelemetryHandler {
    store: Arc<SnapshotStore>,
    publisher: Arc<dyn SnapshotPublisher>,
}

impl IngestTelemetryHandler {
    pub fn new(store: Arc<SnapshotStore>, publisher: Arc<dyn SnapshotPublisher>) -> Self {
        Self { store, publisher }
    }

    pub async fn handle(&self, topic: &str, payload: &[u8]) -> Result<IngestResult, IngestError> {
        // 1. Decode; a bad payload never touches the store
        let record = ProducerRecord::decode(payload)?;

        tracing::debug!(
            topic = %topic,
            event = %record.event,
            metro_count = record.metro_count,
            platform1_count = record.platform1_count,
            platform2_count = record.platform2_count,
            daily_total = record.daily_total,
            device_timestamp = record.timestamp,
            "Telemetry record received"
        );

        // 2. Apply
        let snapshot = self.store.apply(&record);

        // 3. Broadcast before the next payload is accepted
        let delivered = self.publisher.publish(snapshot.clone()).await;

        tracing::debug!(
            publisher = self.publisher.name(),
            delivered,
            last_updated = %snapshot.last_updated,
            "Snapshot broadcast"
        );

        Ok(IngestResult {
            snapshot,
            event: record.event,
            delivered,
        })
    }
}

//! SnapshotPublisher port - Interface for fanning a snapshot out to viewers.
//!
//! The ingest handler publishes every accepted snapshot through this port
//! without knowing how viewers are connected.

use async_trait::async_trait;

use crate::domain::telemetry::Snapshot;

/// Port for pushing a freshly applied snapshot to every connected viewer.
///
/// Implementations must ensure:
/// - Delivery is best-effort per viewer: one viewer failing never blocks or
///   fails delivery to the others
/// - The snapshot has been dispatched to every viewer by the time `publish`
///   returns, so consecutive publishes reach all viewers in the same order
///
/// # Example
///
/// ```ignore
/// let snapshot = store.apply(&record);
/// let delivered = publisher.publish(snapshot).await;
/// ```
#[async_trait]
pub trait SnapshotPublisher: Send + Sync {
    /// Push `snapshot` to every registered viewer.
    ///
    /// Returns the number of viewers the snapshot was handed to.
    async fn publish(&self, snapshot: Snapshot) -> usize;

    /// Publisher name for logging.
    fn name(&self) -> &'static str;
}

#[cfg(test)]
mod tests {
    use super::*;

    // Compile-time check that trait is object-safe
    #[allow(dead_code)]
    fn assert_object_safe(_: &dyn SnapshotPublisher) {}

    #[allow(dead_code)]
    fn assert_send_sync<T: Send + Sync>() {}

    #[test]
    fn snapshot_publisher_is_send_sync() {
        #[allow(dead_code)]
        fn check<T: SnapshotPublisher>() {
            assert_send_sync::<T>();
        }
    }
}

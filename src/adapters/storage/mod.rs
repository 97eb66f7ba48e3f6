//! Storage adapters.
//!
//! - [`SnapshotStore`] - the one in-memory snapshot shared by ingest and fanout

mod snapshot_store;

pub use snapshot_store::SnapshotStore;

//! In-Memory Snapshot Store
//!
//! Holds the one authoritative snapshot. Only the ingest handler applies
//! records; the fanout and HTTP handlers read copies.

use std::sync::{PoisonError, RwLock};

use chrono::{DateTime, Local};

use crate::domain::telemetry::{format_update_time, ProducerRecord, Snapshot};

/// Single-writer, many-reader store for the current snapshot.
///
/// Both operations hand out clones, so a reader never holds a reference into
/// state that the writer is mutating. The lock is never held across an
/// await point.
#[derive(Debug)]
pub struct SnapshotStore {
    current: RwLock<Snapshot>,
}

impl SnapshotStore {
    /// Create a store holding the all-zero snapshot, stamped with the
    /// current time.
    pub fn new() -> Self {
        Self::with_snapshot(Snapshot::initial(format_update_time(&Local::now())))
    }

    /// Create a store with a given starting snapshot (useful for tests).
    pub fn with_snapshot(snapshot: Snapshot) -> Self {
        Self {
            current: RwLock::new(snapshot),
        }
    }

    /// Apply `record` and return the resulting snapshot.
    pub fn apply(&self, record: &ProducerRecord) -> Snapshot {
        self.apply_at(record, &Local::now())
    }

    /// Apply `record` as if it were processed at `at`.
    pub fn apply_at(&self, record: &ProducerRecord, at: &DateTime<Local>) -> Snapshot {
        let mut current = self.current.write().unwrap_or_else(PoisonError::into_inner);
        current.apply_record(record, format_update_time(at));
        current.clone()
    }

    /// Copy of the current snapshot.
    pub fn read(&self) -> Snapshot {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl Default for SnapshotStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::telemetry::EventKind;
    use chrono::TimeZone;
    use std::sync::Arc;

    fn record(total: i64) -> ProducerRecord {
        ProducerRecord {
            metro_count: total * 2,
            platform1_count: total + 1,
            platform2_count: total + 2,
            daily_total: total,
            timestamp: 0,
            event: EventKind::PlatformEnterCat1,
        }
    }

    #[test]
    fn new_store_starts_zeroed() {
        let store = SnapshotStore::new();
        let snapshot = store.read();
        assert_eq!(snapshot.central_station.daily_total, 0);
        assert_eq!(snapshot.next_train.capacity, 300);
        assert_eq!(snapshot.last_updated.len(), 8);
    }

    #[test]
    fn apply_returns_and_stores_new_snapshot() {
        let store = SnapshotStore::with_snapshot(Snapshot::initial("00:00:00"));
        let at = Local.with_ymd_and_hms(2024, 5, 1, 18, 30, 0).unwrap();

        let applied = store.apply_at(&record(10), &at);

        assert_eq!(applied.central_station.daily_total, 10);
        assert_eq!(applied.last_updated, "18:30:00");
        assert_eq!(store.read(), applied);
    }

    #[test]
    fn returned_snapshot_is_a_copy() {
        let store = SnapshotStore::with_snapshot(Snapshot::initial("00:00:00"));
        let first = store.apply(&record(10));
        store.apply(&record(15));

        assert_eq!(first.central_station.daily_total, 10);
        assert_eq!(store.read().central_station.daily_total, 15);
    }

    #[test]
    fn later_record_overwrites_earlier_one() {
        let store = SnapshotStore::with_snapshot(Snapshot::initial("00:00:00"));
        store.apply(&record(15));
        store.apply(&record(10));

        // Last processed wins, even if it was produced first.
        assert_eq!(store.read().north_station.daily_total, 10);
    }

    #[test]
    fn concurrent_readers_never_see_torn_snapshot() {
        let store = Arc::new(SnapshotStore::with_snapshot(Snapshot::initial("00:00:00")));

        let writer = {
            let store = store.clone();
            std::thread::spawn(move || {
                for total in 1..=500 {
                    store.apply(&record(total));
                }
            })
        };

        let readers: Vec<_> = (0..4)
            .map(|_| {
                let store = store.clone();
                std::thread::spawn(move || {
                    for _ in 0..500 {
                        let s = store.read();
                        let total = s.central_station.daily_total;
                        assert_eq!(s.north_station.daily_total, total);
                        if total > 0 {
                            assert_eq!(s.next_train.occupied, total * 2);
                            assert_eq!(s.central_station.waiting, total + 1);
                            assert_eq!(s.north_station.waiting, total + 2);
                        }
                    }
                })
            })
            .collect();

        writer.join().unwrap();
        for reader in readers {
            reader.join().unwrap();
        }
    }
}

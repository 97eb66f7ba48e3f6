//! Snapshot - the derived state broadcast to every viewer.
//!
//! Field names on the wire are the dashboard's (Portuguese) names; the Rust
//! side uses descriptive names and renames on (de)serialization.

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

use super::ProducerRecord;

/// Seat capacity of the train, fixed by the device firmware.
pub const TRAIN_CAPACITY: i64 = 300;

/// Waiting-area section of the snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StationSection {
    #[serde(rename = "aguardando")]
    pub waiting: i64,
    #[serde(rename = "totalHoje")]
    pub daily_total: i64,
}

/// Vehicle section of the snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrainSection {
    #[serde(rename = "ocupados")]
    pub occupied: i64,
    #[serde(rename = "total")]
    pub capacity: i64,
}

impl Default for TrainSection {
    fn default() -> Self {
        Self {
            occupied: 0,
            capacity: TRAIN_CAPACITY,
        }
    }
}

/// Latest derived view of the line.
///
/// Both stations' `daily_total` come from the same device field and are
/// therefore always equal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(rename = "estacaoCentral")]
    pub central_station: StationSection,
    #[serde(rename = "proximoTrem")]
    pub next_train: TrainSection,
    #[serde(rename = "estacaoNorte")]
    pub north_station: StationSection,
    #[serde(rename = "ultimaAtualizacao")]
    pub last_updated: String,
}

impl Snapshot {
    /// All-zero snapshot used at process start.
    pub fn initial(last_updated: impl Into<String>) -> Self {
        Self {
            central_station: StationSection::default(),
            next_train: TrainSection::default(),
            north_station: StationSection::default(),
            last_updated: last_updated.into(),
        }
    }

    /// Overwrite every field derived from `record`.
    pub fn apply_record(&mut self, record: &ProducerRecord, last_updated: impl Into<String>) {
        self.central_station.waiting = record.platform1_count;
        self.central_station.daily_total = record.daily_total;

        self.next_train.occupied = record.metro_count;
        self.next_train.capacity = TRAIN_CAPACITY;

        self.north_station.waiting = record.platform2_count;
        self.north_station.daily_total = record.daily_total;

        self.last_updated = last_updated.into();
    }
}

/// Format a wall-clock instant the way the dashboard displays it (`HH:MM:SS`).
pub fn format_update_time(at: &DateTime<Local>) -> String {
    at.format("%H:%M:%S").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::telemetry::EventKind;
    use chrono::TimeZone;
    use proptest::prelude::*;

    fn record(metro: i64, p1: i64, p2: i64, total: i64) -> ProducerRecord {
        ProducerRecord {
            metro_count: metro,
            platform1_count: p1,
            platform2_count: p2,
            daily_total: total,
            timestamp: 0,
            event: EventKind::NoEvent,
        }
    }

    #[test]
    fn initial_snapshot_is_zeroed_with_fixed_capacity() {
        let snapshot = Snapshot::initial("00:00:00");
        assert_eq!(snapshot.central_station, StationSection::default());
        assert_eq!(snapshot.north_station, StationSection::default());
        assert_eq!(snapshot.next_train.occupied, 0);
        assert_eq!(snapshot.next_train.capacity, 300);
    }

    #[test]
    fn apply_record_maps_device_fields() {
        let mut snapshot = Snapshot::initial("00:00:00");
        snapshot.apply_record(&record(42, 5, 3, 120), "12:34:56");

        assert_eq!(snapshot.central_station.waiting, 5);
        assert_eq!(snapshot.central_station.daily_total, 120);
        assert_eq!(snapshot.next_train.occupied, 42);
        assert_eq!(snapshot.next_train.capacity, 300);
        assert_eq!(snapshot.north_station.waiting, 3);
        assert_eq!(snapshot.north_station.daily_total, 120);
        assert_eq!(snapshot.last_updated, "12:34:56");
    }

    #[test]
    fn serializes_with_dashboard_field_names() {
        let mut snapshot = Snapshot::initial("00:00:00");
        snapshot.apply_record(&record(42, 5, 3, 120), "12:34:56");

        let value = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "estacaoCentral": { "aguardando": 5, "totalHoje": 120 },
                "proximoTrem": { "ocupados": 42, "total": 300 },
                "estacaoNorte": { "aguardando": 3, "totalHoje": 120 },
                "ultimaAtualizacao": "12:34:56"
            })
        );
    }

    #[test]
    fn update_time_is_hours_minutes_seconds() {
        let at = Local.with_ymd_and_hms(2024, 5, 1, 7, 8, 9).unwrap();
        assert_eq!(format_update_time(&at), "07:08:09");
    }

    proptest! {
        #[test]
        fn daily_totals_always_match_record(
            metro in any::<i64>(),
            p1 in any::<i64>(),
            p2 in any::<i64>(),
            total in any::<i64>(),
        ) {
            let mut snapshot = Snapshot::initial("00:00:00");
            snapshot.apply_record(&record(metro, p1, p2, total), "00:00:01");

            prop_assert_eq!(snapshot.central_station.daily_total, total);
            prop_assert_eq!(snapshot.north_station.daily_total, total);
            prop_assert_eq!(snapshot.next_train.capacity, TRAIN_CAPACITY);
            prop_assert_eq!(snapshot.next_train.occupied, metro);
        }
    }
}

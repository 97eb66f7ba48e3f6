//! ProducerRecord - one decoded telemetry message from the device.

use serde::{Deserialize, Serialize};

use super::DecodeError;

/// What happened on the device when the record was produced.
///
/// The set is closed: any other tag on the wire is a decode error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventKind {
    #[serde(rename = "train_board")]
    TrainBoard,
    #[serde(rename = "train_unboard")]
    TrainUnboard,
    #[serde(rename = "platform_enter_cat1")]
    PlatformEnterCat1,
    #[serde(rename = "platform_enter_cat2")]
    PlatformEnterCat2,
    #[serde(rename = "platform_exit_cat1")]
    PlatformExitCat1,
    #[serde(rename = "platform_exit_cat2")]
    PlatformExitCat2,
    #[serde(rename = "none")]
    NoEvent,
}

impl EventKind {
    /// Wire tag, as published by the device.
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::TrainBoard => "train_board",
            EventKind::TrainUnboard => "train_unboard",
            EventKind::PlatformEnterCat1 => "platform_enter_cat1",
            EventKind::PlatformEnterCat2 => "platform_enter_cat2",
            EventKind::PlatformExitCat1 => "platform_exit_cat1",
            EventKind::PlatformExitCat2 => "platform_exit_cat2",
            EventKind::NoEvent => "none",
        }
    }
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Telemetry record published by the device on every state change.
///
/// Immutable once decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProducerRecord {
    /// People aboard the train.
    pub metro_count: i64,
    /// People waiting at the central station platform.
    pub platform1_count: i64,
    /// People waiting at the north station platform.
    pub platform2_count: i64,
    /// Running total for the day, shared by both stations.
    pub daily_total: i64,
    /// Seconds since the device booted.
    pub timestamp: i64,
    pub event: EventKind,
}

impl ProducerRecord {
    /// Decode a raw broker payload.
    ///
    /// Extra fields are ignored; missing fields, wrong types and unknown
    /// event tags are rejected.
    pub fn decode(payload: &[u8]) -> Result<Self, DecodeError> {
        Ok(serde_json::from_slice(payload)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BOARD: &str = r#"{"metro_count":42,"platform1_count":5,"platform2_count":3,"daily_total":120,"timestamp":999,"event":"train_board"}"#;

    #[test]
    fn decodes_device_payload() {
        let record = ProducerRecord::decode(BOARD.as_bytes()).unwrap();
        assert_eq!(record.metro_count, 42);
        assert_eq!(record.platform1_count, 5);
        assert_eq!(record.platform2_count, 3);
        assert_eq!(record.daily_total, 120);
        assert_eq!(record.timestamp, 999);
        assert_eq!(record.event, EventKind::TrainBoard);
    }

    #[test]
    fn decodes_every_event_tag() {
        for kind in [
            EventKind::TrainBoard,
            EventKind::TrainUnboard,
            EventKind::PlatformEnterCat1,
            EventKind::PlatformEnterCat2,
            EventKind::PlatformExitCat1,
            EventKind::PlatformExitCat2,
            EventKind::NoEvent,
        ] {
            let json = format!(
                r#"{{"metro_count":0,"platform1_count":0,"platform2_count":0,"daily_total":0,"timestamp":0,"event":"{}"}}"#,
                kind.as_str()
            );
            let record = ProducerRecord::decode(json.as_bytes()).unwrap();
            assert_eq!(record.event, kind);
        }
    }

    #[test]
    fn ignores_unknown_extra_fields() {
        let json = r#"{"metro_count":1,"platform1_count":2,"platform2_count":3,"daily_total":4,"timestamp":5,"event":"none","rssi":-60}"#;
        assert!(ProducerRecord::decode(json.as_bytes()).is_ok());
    }

    #[test]
    fn rejects_unknown_event_tag() {
        let json = r#"{"metro_count":1,"platform1_count":2,"platform2_count":3,"daily_total":4,"timestamp":5,"event":"door_open"}"#;
        let err = ProducerRecord::decode(json.as_bytes()).unwrap_err();
        assert!(matches!(err, DecodeError::Schema(_)));
    }

    #[test]
    fn rejects_missing_field() {
        let json = r#"{"metro_count":1,"platform1_count":2,"platform2_count":3,"timestamp":5,"event":"none"}"#;
        let err = ProducerRecord::decode(json.as_bytes()).unwrap_err();
        assert!(matches!(err, DecodeError::Schema(_)));
    }

    #[test]
    fn rejects_wrong_type() {
        let json = r#"{"metro_count":"many","platform1_count":2,"platform2_count":3,"daily_total":4,"timestamp":5,"event":"none"}"#;
        assert!(ProducerRecord::decode(json.as_bytes()).is_err());
    }

    #[test]
    fn rejects_non_json_bytes() {
        let err = ProducerRecord::decode(&[0xff, 0xfe, 0x00]).unwrap_err();
        assert!(matches!(err, DecodeError::Malformed(_)));
    }
}

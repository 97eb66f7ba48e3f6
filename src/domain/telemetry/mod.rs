//! Telemetry module - device records and the derived snapshot.
//!
//! - [`ProducerRecord`] is what the device publishes on the broker.
//! - [`Snapshot`] is what every viewer sees.

mod errors;
mod record;
mod snapshot;

pub use errors::DecodeError;
pub use record::{EventKind, ProducerRecord};
pub use snapshot::{format_update_time, Snapshot, StationSection, TrainSection, TRAIN_CAPACITY};

//! Telemetry decode errors.

use serde_json::error::Category;
use thiserror::Error;

/// Why an inbound broker payload could not be decoded into a record.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// Payload is not well-formed JSON (syntax error or truncated input).
    #[error("Malformed telemetry payload: {0}")]
    Malformed(String),

    /// Payload is JSON but does not match the record shape
    /// (missing field, wrong type, unknown event tag).
    #[error("Telemetry payload does not match record schema: {0}")]
    Schema(String),
}

impl From<serde_json::Error> for DecodeError {
    fn from(err: serde_json::Error) -> Self {
        match err.classify() {
            Category::Data => DecodeError::Schema(err.to_string()),
            Category::Syntax | Category::Eof | Category::Io => {
                DecodeError::Malformed(err.to_string())
            }
        }
    }
}

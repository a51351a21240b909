//! Error types for decoding sensor payloads.

use thiserror::Error;
use vitalwatch_types::Channel;

/// A payload that could not be turned into a reading at all.
///
/// These never reach the pipeline; the source records them and moves on
/// to the next payload.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// Payload is not valid JSON.
    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// Payload is JSON but not an object.
    #[error("Expected a JSON object, got {0}")]
    NotAnObject(&'static str),
}

/// A single channel value that was rejected.
///
/// Rejection is isolated to the offending channel; the rest of the reading
/// is still processed.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValueError {
    /// Value is present but not a number (e.g. a string or boolean).
    #[error("{channel}: expected a number, got {found}")]
    NotNumeric {
        channel: Channel,
        found: &'static str,
    },

    /// Value is a number but not finite.
    #[error("{channel}: value is not finite")]
    NotFinite { channel: Channel },

    /// The `bloodPressure` field is present but not an object.
    #[error("bloodPressure: expected an object, got {0}")]
    BadBloodPressure(&'static str),
}

impl ValueError {
    /// The channel affected, if the error is tied to one.
    pub fn channel(&self) -> Option<Channel> {
        match self {
            ValueError::NotNumeric { channel, .. } | ValueError::NotFinite { channel } => {
                Some(*channel)
            }
            ValueError::BadBloodPressure(_) => None,
        }
    }
}

/// Short name of a JSON value's type, for error messages.
pub(crate) fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "a boolean",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_) => "an array",
        serde_json::Value::Object(_) => "an object",
    }
}

//! Sensor payload codec.
//!
//! Decodes the JSON objects produced by the bedside sensor board into
//! [`RawReading`]s and encodes [`EnrichedReading`]s back into the same
//! shape for downstream consumers.
//!
//! Input (all fields optional, unknown fields ignored):
//!
//! ```json
//! {"heartRate": 72, "spo2": 98, "temperature": 36.6,
//!  "bloodPressure": {"systolic": 118, "diastolic": 76}, "bloodSugar": 95}
//! ```
//!
//! Output replaces each value with its smoothed value and adds
//! `<field>_trend` / `<field>_anomaly` siblings, nested the same way:
//!
//! ```json
//! {"timestamp": 1700000000000,
//!  "heartRate": 72.0, "heartRate_trend": "stable", "heartRate_anomaly": false,
//!  "bloodPressure": {"systolic": 118.0, "systolic_trend": "stable", "systolic_anomaly": false}}
//! ```

use serde_json::{Map, Value};
use tracing::warn;
use vitalwatch_types::{Channel, EnrichedReading, RawReading};

use crate::error::{json_kind, DecodeError, ValueError};

/// Key of the nested blood-pressure object.
pub const BLOOD_PRESSURE_KEY: &str = "bloodPressure";

/// Where a channel lives in the payload: optional parent object and field name.
pub fn field_path(channel: Channel) -> (Option<&'static str>, &'static str) {
    match channel {
        Channel::HeartRate => (None, "heartRate"),
        Channel::Spo2 => (None, "spo2"),
        Channel::Temperature => (None, "temperature"),
        Channel::BloodPressureSystolic => (Some(BLOOD_PRESSURE_KEY), "systolic"),
        Channel::BloodPressureDiastolic => (Some(BLOOD_PRESSURE_KEY), "diastolic"),
        Channel::BloodSugar => (None, "bloodSugar"),
    }
}

/// A decoded payload.
#[derive(Debug, Clone, PartialEq)]
pub struct Decoded {
    /// Every channel that carried a usable number.
    pub reading: RawReading,
    /// Channels that were present but unusable. They are left out of
    /// `reading`; the rest of the payload is unaffected.
    pub rejected: Vec<ValueError>,
}

/// Decode one payload from raw bytes.
pub fn decode_slice(bytes: &[u8], timestamp_ms: u64) -> Result<Decoded, DecodeError> {
    let value: Value = serde_json::from_slice(bytes)?;
    decode_value(&value, timestamp_ms)
}

/// Decode one payload from a line of text.
pub fn decode_line(line: &str, timestamp_ms: u64) -> Result<Decoded, DecodeError> {
    let value: Value = serde_json::from_str(line.trim())?;
    decode_value(&value, timestamp_ms)
}

/// Decode an already-parsed payload, stamping it with `timestamp_ms`.
///
/// Any `timestamp` field in the payload is ignored: readings are stamped at
/// ingestion. `null` values are treated as absent.
pub fn decode_value(value: &Value, timestamp_ms: u64) -> Result<Decoded, DecodeError> {
    let obj = value
        .as_object()
        .ok_or_else(|| DecodeError::NotAnObject(json_kind(value)))?;

    let mut reading = RawReading::with_timestamp(timestamp_ms);
    let mut rejected = Vec::new();

    let bp = match obj.get(BLOOD_PRESSURE_KEY) {
        None | Some(Value::Null) => None,
        Some(Value::Object(bp)) => Some(bp),
        Some(other) => {
            rejected.push(ValueError::BadBloodPressure(json_kind(other)));
            None
        }
    };

    for channel in Channel::ALL {
        let (parent, key) = field_path(channel);
        let field = match parent {
            None => obj.get(key),
            Some(_) => bp.and_then(|bp| bp.get(key)),
        };
        match field.map(|v| number(channel, v)) {
            None | Some(Ok(None)) => {}
            Some(Ok(Some(v))) => {
                reading.insert(channel, v);
            }
            Some(Err(e)) => rejected.push(e),
        }
    }

    for e in &rejected {
        warn!("Rejected sensor value: {}", e);
    }

    Ok(Decoded { reading, rejected })
}

fn number(channel: Channel, value: &Value) -> Result<Option<f64>, ValueError> {
    match value {
        Value::Null => Ok(None),
        Value::Number(n) => match n.as_f64() {
            Some(v) if v.is_finite() => Ok(Some(v)),
            _ => Err(ValueError::NotFinite { channel }),
        },
        other => Err(ValueError::NotNumeric {
            channel,
            found: json_kind(other),
        }),
    }
}

/// Encode an enriched reading in the payload shape.
pub fn encode_enriched(reading: &EnrichedReading) -> Value {
    let mut root = Map::new();
    root.insert("timestamp".to_string(), Value::from(reading.timestamp_ms));

    for (channel, r) in reading.iter() {
        let (parent, key) = field_path(channel);
        let target = match parent {
            None => &mut root,
            Some(parent) => {
                let entry = root
                    .entry(parent.to_string())
                    .or_insert_with(|| Value::Object(Map::new()));
                match entry {
                    Value::Object(map) => map,
                    _ => continue,
                }
            }
        };
        target.insert(key.to_string(), Value::from(r.smoothed));
        target.insert(format!("{}_trend", key), Value::from(r.trend.as_str()));
        target.insert(format!("{}_anomaly", key), Value::from(r.anomaly));
    }

    Value::Object(root)
}

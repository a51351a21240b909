//! Measurement channels and the per-channel classification enums.

use core::fmt;
use core::str::FromStr;

/// One physiological measurement stream.
///
/// The set is closed: adding a channel means touching every per-channel
/// table (thresholds, labels, wire keys), which the exhaustive matches below
/// enforce at compile time.
///
/// Declaration order is the canonical processing and reporting order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub enum Channel {
    HeartRate,
    Spo2,
    Temperature,
    BloodPressureSystolic,
    BloodPressureDiastolic,
    BloodSugar,
}

impl Channel {
    /// All channels in declaration order.
    pub const ALL: [Channel; 6] = [
        Channel::HeartRate,
        Channel::Spo2,
        Channel::Temperature,
        Channel::BloodPressureSystolic,
        Channel::BloodPressureDiastolic,
        Channel::BloodSugar,
    ];

    /// The channel's identifier as used on the wire and in config files.
    pub fn key(&self) -> &'static str {
        match self {
            Channel::HeartRate => "heartRate",
            Channel::Spo2 => "spo2",
            Channel::Temperature => "temperature",
            Channel::BloodPressureSystolic => "bloodPressureSystolic",
            Channel::BloodPressureDiastolic => "bloodPressureDiastolic",
            Channel::BloodSugar => "bloodSugar",
        }
    }

    /// Human-readable name used in alert messages.
    pub fn label(&self) -> &'static str {
        match self {
            Channel::HeartRate => "heart rate",
            Channel::Spo2 => "SpO2",
            Channel::Temperature => "temperature",
            Channel::BloodPressureSystolic => "systolic pressure",
            Channel::BloodPressureDiastolic => "diastolic pressure",
            Channel::BloodSugar => "blood sugar",
        }
    }

    /// Measurement unit suffix.
    pub fn unit(&self) -> &'static str {
        match self {
            Channel::HeartRate => "BPM",
            Channel::Spo2 => "%",
            Channel::Temperature => "°C",
            Channel::BloodPressureSystolic | Channel::BloodPressureDiastolic => "mmHg",
            Channel::BloodSugar => "mg/dL",
        }
    }

    /// Whether the unit is written flush against the value (`97%`, `37.5°C`).
    pub fn unit_is_suffix(&self) -> bool {
        matches!(self, Channel::Spo2 | Channel::Temperature)
    }

    /// Format a value with this channel's unit.
    pub fn format_value(&self, value: f64) -> alloc::string::String {
        if self.unit_is_suffix() {
            alloc::format!("{}{}", value, self.unit())
        } else {
            alloc::format!("{} {}", value, self.unit())
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Error returned when parsing an unknown channel key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownChannel(pub alloc::string::String);

impl fmt::Display for UnknownChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown channel: {}", self.0)
    }
}

#[cfg(feature = "std")]
impl std::error::Error for UnknownChannel {}

impl FromStr for Channel {
    type Err = UnknownChannel;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Channel::ALL
            .iter()
            .copied()
            .find(|c| c.key() == s)
            .ok_or_else(|| UnknownChannel(s.into()))
    }
}

/// Direction of a channel's recent values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Trend {
    Increasing,
    Decreasing,
    #[default]
    Stable,
}

impl Trend {
    pub fn as_str(&self) -> &'static str {
        match self {
            Trend::Increasing => "increasing",
            Trend::Decreasing => "decreasing",
            Trend::Stable => "stable",
        }
    }
}

impl fmt::Display for Trend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Alert severity.
///
/// Ordered so that `Danger > Warning`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Severity {
    Warning,
    Danger,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Warning => "warning",
            Severity::Danger => "danger",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

//! Threshold alerts.

use alloc::string::String;

use crate::{Channel, Severity, Trend};

/// A threshold-violation notification for one channel.
///
/// Alerts are ephemeral: produced for a single reading, emitted, and not
/// retained. They carry the channel's trend and anomaly flag so a consumer
/// can tell a sudden spike from a slow drift.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Alert {
    pub severity: Severity,
    pub channel: Channel,
    /// Human-readable description, e.g. `"Low heart rate: 45 BPM"`.
    pub message: String,
    /// The smoothed value that violated the bound.
    pub value: f64,
    pub trend: Trend,
    pub anomaly: bool,
    /// Timestamp of the reading that produced the alert.
    #[cfg_attr(feature = "serde", serde(rename = "timestamp"))]
    pub timestamp_ms: u64,
}

impl Alert {
    pub fn is_danger(&self) -> bool {
        self.severity == Severity::Danger
    }
}

#[cfg(all(test, feature = "serde"))]
mod tests {
    use super::*;

    #[test]
    fn test_alert_json_shape() {
        let alert = Alert {
            severity: Severity::Warning,
            channel: Channel::HeartRate,
            message: "Low heart rate: 45 BPM".into(),
            value: 45.0,
            trend: Trend::Stable,
            anomaly: false,
            timestamp_ms: 1_700_000_000_000,
        };

        let json = serde_json::to_value(&alert).unwrap();
        assert_eq!(json["severity"], "warning");
        assert_eq!(json["channel"], "heartRate");
        assert_eq!(json["trend"], "stable");
        assert_eq!(json["timestamp"], 1_700_000_000_000u64);
        assert!(!alert.is_danger());
    }
}

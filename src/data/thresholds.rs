//! Fixed per-channel bounds and threshold-to-alert evaluation.
//!
//! Bounds are compared against the **smoothed** value of a channel, never
//! the raw sample, so a single noisy reading does not raise an alert on its
//! own once a window has built up.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use vitalwatch_types::{Alert, Channel, ChannelReading, EnrichedReading, Severity};

/// One side of a channel's normal range.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bound {
    pub limit: f64,
    pub severity: Severity,
}

impl Bound {
    pub const fn warning(limit: f64) -> Self {
        Self {
            limit,
            severity: Severity::Warning,
        }
    }

    pub const fn danger(limit: f64) -> Self {
        Self {
            limit,
            severity: Severity::Danger,
        }
    }
}

/// Low and high bounds for a channel. An unset side never alerts.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ChannelBounds {
    #[serde(default)]
    pub low: Option<Bound>,
    #[serde(default)]
    pub high: Option<Bound>,
}

impl ChannelBounds {
    pub const fn new(low: Option<Bound>, high: Option<Bound>) -> Self {
        Self { low, high }
    }

    /// Which side, if any, a value violates. Comparisons are strict.
    ///
    /// The low side is checked first; the high side only when the low side
    /// did not fire.
    pub fn violation(&self, value: f64) -> Option<(Side, Bound)> {
        if let Some(low) = self.low {
            if value < low.limit {
                return Some((Side::Low, low));
            }
        }
        if let Some(high) = self.high {
            if value > high.limit {
                return Some((Side::High, high));
            }
        }
        None
    }
}

/// Which side of a range was crossed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Low,
    High,
}

impl Side {
    pub fn label(&self) -> &'static str {
        match self {
            Side::Low => "Low",
            Side::High => "High",
        }
    }
}

/// Bounds for every channel.
///
/// The default table alerts on the low side only for heart rate, SpO2 and
/// temperature. Blood pressure and blood sugar have no low bound unless one
/// is configured.
#[derive(Debug, Clone, PartialEq)]
pub struct ThresholdTable {
    bounds: BTreeMap<Channel, ChannelBounds>,
}

impl Default for ThresholdTable {
    fn default() -> Self {
        let bounds = Channel::ALL.iter().map(|&c| (c, default_bounds(c))).collect();
        Self { bounds }
    }
}

fn default_bounds(channel: Channel) -> ChannelBounds {
    match channel {
        Channel::HeartRate => {
            ChannelBounds::new(Some(Bound::warning(60.0)), Some(Bound::danger(100.0)))
        }
        Channel::Spo2 => ChannelBounds::new(Some(Bound::danger(95.0)), None),
        Channel::Temperature => {
            ChannelBounds::new(Some(Bound::warning(36.1)), Some(Bound::danger(37.2)))
        }
        Channel::BloodPressureSystolic => ChannelBounds::new(None, Some(Bound::danger(120.0))),
        Channel::BloodPressureDiastolic => ChannelBounds::new(None, Some(Bound::danger(80.0))),
        Channel::BloodSugar => ChannelBounds::new(None, Some(Bound::danger(140.0))),
    }
}

impl ThresholdTable {
    /// A table with no bounds at all.
    pub fn empty() -> Self {
        Self {
            bounds: BTreeMap::new(),
        }
    }

    /// Bounds configured for a channel (all-unset if none).
    pub fn bounds(&self, channel: Channel) -> ChannelBounds {
        self.bounds.get(&channel).copied().unwrap_or_default()
    }

    /// Replace the bounds for one channel.
    pub fn set(&mut self, channel: Channel, bounds: ChannelBounds) {
        self.bounds.insert(channel, bounds);
    }

    /// Builder-style [`ThresholdTable::set`].
    pub fn with(mut self, channel: Channel, bounds: ChannelBounds) -> Self {
        self.set(channel, bounds);
        self
    }

    /// Severity a smoothed value maps to, or `None` if within range.
    pub fn status(&self, channel: Channel, value: f64) -> Option<Severity> {
        self.bounds(channel).violation(value).map(|(_, b)| b.severity)
    }

    /// Produce alerts for every channel of a reading that is out of range.
    ///
    /// At most one alert per channel, in canonical channel order.
    pub fn evaluate(&self, reading: &EnrichedReading) -> Vec<Alert> {
        reading
            .iter()
            .filter_map(|(channel, r)| self.check(channel, r, reading.timestamp_ms))
            .collect()
    }

    fn check(&self, channel: Channel, reading: &ChannelReading, timestamp_ms: u64) -> Option<Alert> {
        let (side, bound) = self.bounds(channel).violation(reading.smoothed)?;
        Some(Alert {
            severity: bound.severity,
            channel,
            message: format!(
                "{} {}: {}",
                side.label(),
                channel.label(),
                channel.format_value(round2(reading.smoothed))
            ),
            value: reading.smoothed,
            trend: reading.trend,
            anomaly: reading.anomaly,
            timestamp_ms,
        })
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

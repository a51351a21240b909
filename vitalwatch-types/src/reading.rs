//! Raw and enriched readings.

use alloc::collections::BTreeMap;

use crate::{Channel, Trend};

/// One raw sample from the monitored subject.
///
/// Holds a value for each channel that was present in the sensor payload.
/// Channels absent from a reading are simply not processed for that cycle.
///
/// # Example
///
/// ```rust
/// use vitalwatch_types::{Channel, RawReading};
///
/// let reading = RawReading::with_timestamp(1_700_000_000_000)
///     .with(Channel::BloodPressureSystolic, 118.0)
///     .with(Channel::BloodPressureDiastolic, 76.0);
///
/// let channels: Vec<Channel> = reading.channels().collect();
/// assert_eq!(
///     channels,
///     vec![Channel::BloodPressureSystolic, Channel::BloodPressureDiastolic]
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RawReading {
    /// Unix timestamp in milliseconds, attached at ingestion.
    #[cfg_attr(feature = "serde", serde(rename = "timestamp"))]
    pub timestamp_ms: u64,

    /// Value per present channel.
    pub values: BTreeMap<Channel, f64>,
}

impl RawReading {
    /// Create an empty reading stamped with the current time.
    #[cfg(feature = "std")]
    pub fn new() -> Self {
        Self::with_timestamp(current_timestamp_ms())
    }

    /// Create an empty reading with a specific timestamp.
    pub fn with_timestamp(timestamp_ms: u64) -> Self {
        Self {
            timestamp_ms,
            values: BTreeMap::new(),
        }
    }

    /// Add a channel value, builder style.
    pub fn with(mut self, channel: Channel, value: f64) -> Self {
        self.values.insert(channel, value);
        self
    }

    /// Set a channel value, replacing any previous one.
    pub fn insert(&mut self, channel: Channel, value: f64) -> Option<f64> {
        self.values.insert(channel, value)
    }

    /// Value for a channel, if present.
    pub fn get(&self, channel: Channel) -> Option<f64> {
        self.values.get(&channel).copied()
    }

    /// Present channels in canonical order.
    pub fn channels(&self) -> impl Iterator<Item = Channel> + '_ {
        self.values.keys().copied()
    }

    /// Iterate over `(channel, value)` pairs in canonical order.
    pub fn iter(&self) -> impl Iterator<Item = (Channel, f64)> + '_ {
        self.values.iter().map(|(c, v)| (*c, *v))
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }
}

/// Processed view of one channel in a reading.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ChannelReading {
    /// The sample as received.
    pub raw: f64,
    /// Mean of the channel's window including this sample.
    pub smoothed: f64,
    /// Slope direction of the channel's window including this sample.
    pub trend: Trend,
    /// Whether the sample is an outlier relative to the prior window.
    pub anomaly: bool,
}

/// A reading after it has passed through the processing pipeline.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EnrichedReading {
    /// Timestamp copied from the raw reading.
    #[cfg_attr(feature = "serde", serde(rename = "timestamp"))]
    pub timestamp_ms: u64,

    /// Processed values per present channel.
    pub channels: BTreeMap<Channel, ChannelReading>,
}

impl EnrichedReading {
    pub fn with_timestamp(timestamp_ms: u64) -> Self {
        Self {
            timestamp_ms,
            channels: BTreeMap::new(),
        }
    }

    /// Processed values for a channel, if it was present.
    pub fn get(&self, channel: Channel) -> Option<&ChannelReading> {
        self.channels.get(&channel)
    }

    /// Iterate over processed channels in canonical order.
    pub fn iter(&self) -> impl Iterator<Item = (Channel, &ChannelReading)> {
        self.channels.iter().map(|(c, r)| (*c, r))
    }

    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    pub fn len(&self) -> usize {
        self.channels.len()
    }

    /// Whether any channel in this reading was flagged anomalous.
    pub fn has_anomaly(&self) -> bool {
        self.channels.values().any(|r| r.anomaly)
    }
}

/// Get current timestamp in milliseconds since Unix epoch.
#[cfg(feature = "std")]
pub fn current_timestamp_ms() -> u64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

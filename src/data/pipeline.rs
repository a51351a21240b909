//! Per-reading orchestration of the window store, statistics and thresholds.

use tracing::{debug, warn};
use vitalwatch_types::{Alert, Channel, ChannelReading, EnrichedReading, RawReading};

use super::stats;
use super::window::WindowStore;
use crate::config::PipelineConfig;

/// Result of processing one raw reading.
#[derive(Debug, Clone, PartialEq)]
pub struct Processed {
    pub reading: EnrichedReading,
    pub alerts: Vec<Alert>,
    /// Channels skipped because their value was not finite.
    pub rejected: Vec<Channel>,
}

/// The stateful processing pipeline for one monitored subject.
///
/// Owns the rolling window history, so independent subjects need
/// independent pipelines. `process` takes `&mut self`: one reading is
/// processed to completion before the next can start.
///
/// # Example
///
/// ```
/// use vitalwatch::{Pipeline, PipelineConfig};
/// use vitalwatch_types::{Channel, RawReading, Severity};
///
/// let mut pipeline = Pipeline::new(PipelineConfig::default());
///
/// let raw = RawReading::with_timestamp(0).with(Channel::HeartRate, 45.0);
/// let processed = pipeline.process(&raw);
///
/// let hr = processed.reading.get(Channel::HeartRate).unwrap();
/// assert_eq!(hr.smoothed, 45.0);
/// assert_eq!(processed.alerts.len(), 1);
/// assert_eq!(processed.alerts[0].severity, Severity::Warning);
/// ```
#[derive(Debug, Clone)]
pub struct Pipeline {
    config: PipelineConfig,
    windows: WindowStore,
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new(PipelineConfig::default())
    }
}

impl Pipeline {
    pub fn new(config: PipelineConfig) -> Self {
        let windows = WindowStore::new(config.window_capacity);
        Self { config, windows }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Read-only view of the rolling history.
    pub fn windows(&self) -> &WindowStore {
        &self.windows
    }

    /// Enrich a raw reading and evaluate it against the threshold table.
    ///
    /// Each present channel is handled independently: a non-finite value
    /// skips that channel only and never touches its window.
    pub fn process(&mut self, raw: &RawReading) -> Processed {
        let mut reading = EnrichedReading::with_timestamp(raw.timestamp_ms);
        let mut rejected = Vec::new();

        for (channel, value) in raw.iter() {
            if !value.is_finite() {
                warn!(%channel, value, "Skipping non-finite value");
                rejected.push(channel);
                continue;
            }
            let enriched = self.process_channel(channel, value);
            reading.channels.insert(channel, enriched);
        }

        let alerts = self.config.thresholds.evaluate(&reading);

        Processed {
            reading,
            alerts,
            rejected,
        }
    }

    fn process_channel(&mut self, channel: Channel, value: f64) -> ChannelReading {
        let history = self.windows.snapshot(channel);
        self.windows.append(channel, value);
        let window = self.windows.snapshot(channel);

        let smoothed = stats::smooth(&window);
        let trend = stats::trend(&window, self.config.trend_slope_threshold);
        let anomaly = stats::is_anomaly(&history, value, self.config.anomaly_z_multiplier);

        if anomaly {
            warn!(%channel, value, smoothed, "Anomalous reading");
        }
        debug!(%channel, raw = value, smoothed, %trend, anomaly, window = window.len(), "Processed");

        ChannelReading {
            raw: value,
            smoothed,
            trend,
            anomaly,
        }
    }

    /// Forget all history, e.g. when the sensor is re-attached to a new subject.
    pub fn reset(&mut self) {
        self.windows.clear();
    }
}

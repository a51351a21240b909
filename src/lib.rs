//! # vitalwatch
//!
//! A stateful processing pipeline and CLI for streamed vital-sign readings.
//!
//! Each reading carries up to six channels (heart rate, SpO2, temperature,
//! systolic and diastolic blood pressure, blood sugar). For every channel
//! present the pipeline keeps a rolling window of recent values, computes a
//! smoothed value, a trend and an anomaly flag, and checks the smoothed value
//! against a threshold table to raise alerts.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                          Monitor                            │
//! │  ┌─────────┐    ┌──────────┐    ┌──────────┐    ┌────────┐  │
//! │  │ source  │───▶│   wire   │───▶│   data   │───▶│ output │  │
//! │  │ (input) │    │ (decode) │    │(pipeline)│    │        │  │
//! │  └────┬────┘    └──────────┘    └──────────┘    └────────┘  │
//! │       │                                                     │
//! │       ▲── FileSource | StreamSource | ChannelSource         │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! - **[`source`]**: Reading source abstraction ([`ReadingSource`] trait) with
//!   implementations for file tailing, byte streams, and channel-based input
//! - **[`wire`]**: JSON payload decoding and the enriched output shape
//! - **[`data`]**: The [`Pipeline`]: rolling windows, statistics and thresholds
//! - **[`output`]**: Where `sensor_data` and `health_alerts` events go
//! - **[`monitor`]**: The [`Monitor`] runner tying the above together
//!
//! ## Usage
//!
//! ### As a CLI tool
//!
//! ```bash
//! # Tail a capture file
//! vitalwatch --file vitals.ndjson
//!
//! # Read from a TCP bridge and forward events
//! vitalwatch --connect localhost:9090 --forward localhost:9100
//! ```
//!
//! ### As a library
//!
//! ```
//! use vitalwatch::{Pipeline, PipelineConfig};
//! use vitalwatch_types::{Channel, RawReading};
//!
//! let mut pipeline = Pipeline::new(PipelineConfig::default());
//! let processed = pipeline.process(&RawReading::with_timestamp(0).with(Channel::Spo2, 93.0));
//! assert_eq!(processed.alerts.len(), 1);
//! ```
//!
//! ### With a channel source
//!
//! ```
//! use vitalwatch::{ChannelSource, Monitor, Output, Pipeline};
//!
//! let (tx, source) = ChannelSource::create("bedside", 16);
//! let (output, rx) = Output::channel(16);
//! let monitor = Monitor::new(Box::new(source), Pipeline::default(), vec![output]);
//! ```

pub mod config;
pub mod data;
pub mod error;
pub mod monitor;
pub mod output;
pub mod source;
pub mod wire;

// Re-export main types for convenience
pub use config::PipelineConfig;
pub use data::{Pipeline, Processed, ThresholdTable, WindowStore};
pub use error::{DecodeError, ValueError};
pub use monitor::{Monitor, MonitorStats};
pub use output::{Event, Output};
pub use source::{ChannelSource, FileSource, ReadingSource, StreamSource};
pub use wire::Decoded;

pub use vitalwatch_types::{
    Alert, Channel, ChannelReading, EnrichedReading, RawReading, Severity, Trend,
};

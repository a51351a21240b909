//! The stateful metric-processing pipeline.
//!
//! This module turns raw readings into enriched readings and threshold
//! alerts.
//!
//! ## Submodules
//!
//! - [`window`]: Bounded per-channel history ([`WindowStore`])
//! - [`stats`]: Smoothing, trend and anomaly computations over a window
//! - [`thresholds`]: Per-channel bounds and alert generation ([`ThresholdTable`])
//! - [`pipeline`]: Per-reading orchestration ([`Pipeline`])
//!
//! ## Data Flow
//!
//! ```text
//! RawReading
//!        │
//!        ▼
//! Pipeline::process()
//!        │
//!        ├──▶ WindowStore::append()        (per present channel)
//!        │
//!        ├──▶ smooth / trend / is_anomaly  ──▶ EnrichedReading
//!        │
//!        └──▶ ThresholdTable::evaluate()   ──▶ Vec<Alert>
//! ```

pub mod pipeline;
pub mod stats;
pub mod thresholds;
pub mod window;

pub use pipeline::{Pipeline, Processed};
pub use thresholds::{Bound, ChannelBounds, Side, ThresholdTable};
pub use window::WindowStore;

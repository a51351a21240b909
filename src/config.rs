//! Pipeline configuration.
//!
//! Every tunable of the pipeline lives here and is passed in at
//! construction. Values come from (lowest to highest precedence) the
//! built-in defaults, an optional TOML file, and `VITALWATCH__*`
//! environment variables.
//!
//! ```toml
//! window_capacity = 10
//! trend_slope_threshold = 0.1
//! anomaly_z_multiplier = 2.0
//!
//! [thresholds.bloodSugar]
//! low = { limit = 70.0, severity = "warning" }
//! high = { limit = 140.0, severity = "danger" }
//! ```

use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use config::{Config, ConfigBuilder, Environment, File, FileFormat};
use serde::Deserialize;
use vitalwatch_types::Channel;

use crate::data::stats::{DEFAULT_ANOMALY_Z_MULTIPLIER, DEFAULT_TREND_SLOPE_THRESHOLD};
use crate::data::thresholds::{ChannelBounds, ThresholdTable};
use crate::data::window::DEFAULT_WINDOW_CAPACITY;

/// Environment variable prefix for overrides.
pub const ENV_PREFIX: &str = "VITALWATCH";

/// Tunables for a [`Pipeline`](crate::Pipeline).
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    /// Raw values retained per channel.
    pub window_capacity: usize,
    /// Slope magnitude separating `stable` from a trend.
    pub trend_slope_threshold: f64,
    /// Standard deviations from the prior mean that count as an anomaly.
    pub anomaly_z_multiplier: f64,
    /// Alerting bounds per channel.
    pub thresholds: ThresholdTable,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            window_capacity: DEFAULT_WINDOW_CAPACITY,
            trend_slope_threshold: DEFAULT_TREND_SLOPE_THRESHOLD,
            anomaly_z_multiplier: DEFAULT_ANOMALY_Z_MULTIPLIER,
            thresholds: ThresholdTable::default(),
        }
    }
}

/// On-disk shape. Everything optional so partial files layer over defaults.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ConfigFile {
    window_capacity: Option<usize>,
    trend_slope_threshold: Option<f64>,
    anomaly_z_multiplier: Option<f64>,
    thresholds: BTreeMap<String, ChannelBounds>,
}

impl PipelineConfig {
    /// Load configuration from an optional TOML file plus the environment.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(File::from(path).format(FileFormat::Toml));
        }
        Self::from_builder(builder)
            .with_context(|| match path {
                Some(p) => format!("Failed to load config from {}", p.display()),
                None => "Failed to load config from environment".to_string(),
            })
    }

    /// Parse configuration from a TOML string (environment still applies).
    pub fn from_toml(content: &str) -> Result<Self> {
        Self::from_builder(Config::builder().add_source(File::from_str(content, FileFormat::Toml)))
    }

    fn from_builder(
        builder: ConfigBuilder<config::builder::DefaultState>,
    ) -> Result<Self> {
        let file: ConfigFile = builder
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;

        let mut cfg = Self::default();
        if let Some(capacity) = file.window_capacity {
            cfg.window_capacity = capacity;
        }
        if let Some(threshold) = file.trend_slope_threshold {
            cfg.trend_slope_threshold = threshold;
        }
        if let Some(z) = file.anomaly_z_multiplier {
            cfg.anomaly_z_multiplier = z;
        }
        for (key, bounds) in file.thresholds {
            let channel = resolve_channel(&key)?;
            cfg.thresholds.set(channel, bounds);
        }

        cfg.validate()?;
        Ok(cfg)
    }

    /// Reject values the pipeline cannot work with.
    pub fn validate(&self) -> Result<()> {
        if self.window_capacity == 0 {
            bail!("window_capacity must be at least 1");
        }
        if !self.trend_slope_threshold.is_finite() || self.trend_slope_threshold < 0.0 {
            bail!(
                "trend_slope_threshold must be finite and non-negative, got {}",
                self.trend_slope_threshold
            );
        }
        if !self.anomaly_z_multiplier.is_finite() || self.anomaly_z_multiplier < 0.0 {
            bail!(
                "anomaly_z_multiplier must be finite and non-negative, got {}",
                self.anomaly_z_multiplier
            );
        }
        for channel in Channel::ALL {
            let bounds = self.thresholds.bounds(channel);
            for bound in bounds.low.iter().chain(bounds.high.iter()) {
                if !bound.limit.is_finite() {
                    bail!("threshold for {} must be finite", channel);
                }
            }
        }
        Ok(())
    }
}

/// Match a config key to a channel, ignoring case.
///
/// Environment variables arrive lowercased, so `heartrate` must resolve the
/// same as `heartRate`.
fn resolve_channel(key: &str) -> Result<Channel> {
    Channel::ALL
        .iter()
        .copied()
        .find(|c| c.key().eq_ignore_ascii_case(key))
        .with_context(|| format!("Unknown channel in thresholds: {}", key))
}

/// Suffix to nanoseconds multiplier (order matters: longer suffixes first)
const UNITS: &[(&str, f64)] = &[
    ("ns", 1.0),
    ("us", 1_000.0),
    ("ms", 1_000_000.0),
    ("s", 1_000_000_000.0),
];

/// Parse interval strings like `"100ms"`, `"1s"`, `"0.5s"` for the CLI.
pub fn parse_interval(s: &str) -> Result<Duration> {
    let s = s.trim();

    for (suffix, multiplier) in UNITS {
        if let Some(val_str) = s.strip_suffix(suffix) {
            let val: f64 = val_str
                .trim()
                .parse()
                .with_context(|| format!("Invalid interval: {}", s))?;
            if !val.is_finite() || val < 0.0 {
                bail!("Invalid interval: {}", s);
            }
            return Ok(Duration::from_nanos((val * multiplier) as u64));
        }
    }

    bail!("Unknown interval format: {} (expected e.g. \"100ms\" or \"1s\")", s)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::thresholds::Bound;
    use vitalwatch_types::Severity;

    #[test]
    fn default_matches_documented_constants() {
        let cfg = PipelineConfig::default();
        assert_eq!(cfg.window_capacity, 10);
        assert_eq!(cfg.trend_slope_threshold, 0.1);
        assert_eq!(cfg.anomaly_z_multiplier, 2.0);
        assert_eq!(cfg.thresholds, ThresholdTable::default());
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn toml_overrides_scalars() {
        let cfg = PipelineConfig::from_toml(
            r#"
            window_capacity = 3
            trend_slope_threshold = 0.5
            anomaly_z_multiplier = 3.0
            "#,
        )
        .unwrap();

        assert_eq!(cfg.window_capacity, 3);
        assert_eq!(cfg.trend_slope_threshold, 0.5);
        assert_eq!(cfg.anomaly_z_multiplier, 3.0);
    }

    #[test]
    fn empty_toml_is_default() {
        let cfg = PipelineConfig::from_toml("").unwrap();
        assert_eq!(cfg, PipelineConfig::default());
    }

    #[test]
    fn threshold_override_replaces_one_channel() {
        let cfg = PipelineConfig::from_toml(
            r#"
            [thresholds.bloodSugar]
            low = { limit = 70.0, severity = "warning" }
            high = { limit = 180.0, severity = "danger" }
            "#,
        )
        .unwrap();

        let sugar = cfg.thresholds.bounds(Channel::BloodSugar);
        assert_eq!(sugar.low, Some(Bound::warning(70.0)));
        assert_eq!(sugar.high, Some(Bound::danger(180.0)));

        // Untouched channels keep their defaults
        assert_eq!(
            cfg.thresholds.status(Channel::HeartRate, 45.0),
            Some(Severity::Warning)
        );
    }

    #[test]
    fn threshold_with_one_side_unsets_the_other() {
        let cfg = PipelineConfig::from_toml(
            r#"
            [thresholds.heartRate]
            high = { limit = 120.0, severity = "warning" }
            "#,
        )
        .unwrap();

        assert_eq!(cfg.thresholds.status(Channel::HeartRate, 30.0), None);
        assert_eq!(
            cfg.thresholds.status(Channel::HeartRate, 130.0),
            Some(Severity::Warning)
        );
    }

    #[test]
    fn unknown_channel_is_rejected() {
        let err = PipelineConfig::from_toml(
            r#"
            [thresholds.pulse]
            high = { limit = 1.0, severity = "danger" }
            "#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("pulse"));
    }

    #[test]
    fn zero_capacity_is_rejected() {
        assert!(PipelineConfig::from_toml("window_capacity = 0").is_err());
    }

    #[test]
    fn negative_multiplier_is_rejected() {
        assert!(PipelineConfig::from_toml("anomaly_z_multiplier = -1.0").is_err());
    }

    #[test]
    fn load_from_file() {
        use std::io::Write;
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "window_capacity = 5").unwrap();

        let cfg = PipelineConfig::load(Some(file.path())).unwrap();
        assert_eq!(cfg.window_capacity, 5);
    }

    #[test]
    fn load_missing_file_fails() {
        let err = PipelineConfig::load(Some(Path::new("/nonexistent/vitalwatch.toml")));
        assert!(err.is_err());
    }

    #[test]
    fn parse_interval_units() {
        assert_eq!(parse_interval("100ms").unwrap(), Duration::from_millis(100));
        assert_eq!(parse_interval("1s").unwrap(), Duration::from_secs(1));
        assert_eq!(parse_interval("0.5s").unwrap(), Duration::from_millis(500));
        assert_eq!(parse_interval("250us").unwrap(), Duration::from_micros(250));
    }

    #[test]
    fn parse_interval_rejects_garbage() {
        assert!(parse_interval("fast").is_err());
        assert!(parse_interval("10").is_err());
        assert!(parse_interval("-1s").is_err());
    }
}

//! Moving statistics over a channel window: smoothing, trend and anomaly.
//!
//! All functions are pure and operate on plain slices so they can be
//! exercised without a pipeline.

use vitalwatch_types::Trend;

/// Default slope magnitude above which a window counts as trending.
pub const DEFAULT_TREND_SLOPE_THRESHOLD: f64 = 0.1;

/// Default number of standard deviations for the anomaly test.
pub const DEFAULT_ANOMALY_Z_MULTIPLIER: f64 = 2.0;

/// Minimum prior history required before anything is flagged.
pub const MIN_ANOMALY_HISTORY: usize = 3;

/// Arithmetic mean; `0.0` for an empty slice.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Population standard deviation; `0.0` for an empty slice.
pub fn population_std(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let m = mean(values);
    let variance = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / values.len() as f64;
    variance.sqrt()
}

/// Smoothed value of a window: the mean of everything in it.
pub fn smooth(values: &[f64]) -> f64 {
    mean(values)
}

/// Least-squares slope of value against index `0..n`.
///
/// Returns `None` with fewer than two points.
pub fn slope(values: &[f64]) -> Option<f64> {
    let n = values.len();
    if n < 2 {
        return None;
    }

    let x_mean = (n - 1) as f64 / 2.0;
    let y_mean = mean(values);

    let (num, den) = values
        .iter()
        .enumerate()
        .fold((0.0, 0.0), |(num, den), (i, y)| {
            let dx = i as f64 - x_mean;
            (num + dx * (y - y_mean), den + dx * dx)
        });

    // den > 0 whenever n >= 2
    Some(num / den)
}

/// Classify a window's direction from its regression slope.
///
/// `threshold` is compared against the raw slope and is not scaled to the
/// channel's units.
pub fn trend(values: &[f64], threshold: f64) -> Trend {
    match slope(values) {
        Some(s) if s > threshold => Trend::Increasing,
        Some(s) if s < -threshold => Trend::Decreasing,
        _ => Trend::Stable,
    }
}

/// Z-score test of `current` against the prior `history`.
///
/// `history` must not contain `current`. With fewer than
/// [`MIN_ANOMALY_HISTORY`] prior values nothing is flagged. A perfectly flat
/// history (zero deviation) flags any value that differs from it.
pub fn is_anomaly(history: &[f64], current: f64, z_multiplier: f64) -> bool {
    if history.len() < MIN_ANOMALY_HISTORY {
        return false;
    }
    let m = mean(history);
    let std = population_std(history);
    (current - m).abs() > z_multiplier * std
}

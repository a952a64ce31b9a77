//! Latency statistics
//!
//! Percentiles use the nearest-rank estimator with floor indexing:
//! `sorted[floor(p * n)]`, clamped to the last element. No interpolation.

use crate::types::Percentiles;

/// Value at percentile `p` (0..=1) of an ascending slice; 0 when empty
pub fn percentile(sorted: &[f64], p: f64) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    let n = sorted.len();
    let index = ((p * n as f64).floor() as usize).min(n - 1);
    sorted[index]
}

/// Mean of the values; 0 when empty
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

/// Sort durations ascending. NaN values are dropped.
pub fn sorted_durations<I: IntoIterator<Item = f64>>(durations: I) -> Vec<f64> {
    let mut values: Vec<f64> = durations.into_iter().filter(|d| !d.is_nan()).collect();
    values.sort_by(f64::total_cmp);
    values
}

impl Percentiles {
    /// p50/p95/p99 of an ascending slice
    pub fn from_sorted(sorted: &[f64]) -> Self {
        Self {
            p50: percentile(sorted, 0.50),
            p95: percentile(sorted, 0.95),
            p99: percentile(sorted, 0.99),
        }
    }
}

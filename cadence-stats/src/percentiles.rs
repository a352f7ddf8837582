//! Percentiles
//!
//! Computed over every sample. Slow outliers are part of the tail and stay in.

use serde::{Deserialize, Serialize};

/// Tail percentiles of a sample set
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Percentiles {
    /// 50th percentile
    pub p50: f64,
    /// 75th percentile
    pub p75: f64,
    /// 90th percentile
    pub p90: f64,
    /// 99th percentile
    pub p99: f64,
}

impl Percentiles {
    /// Percentiles of `samples`
    pub fn of(samples: &[f64]) -> Self {
        let sorted = sorted(samples);
        Self {
            p50: interpolate(&sorted, 50.0),
            p75: interpolate(&sorted, 75.0),
            p90: interpolate(&sorted, 90.0),
            p99: interpolate(&sorted, 99.0),
        }
    }
}

/// The `p`th percentile (0 to 100), interpolated linearly between ranks.
///
/// Empty input yields 0.
pub fn percentile(samples: &[f64], p: f64) -> f64 {
    interpolate(&sorted(samples), p)
}

pub(crate) fn sorted(samples: &[f64]) -> Vec<f64> {
    let mut sorted = samples.to_vec();
    sorted.sort_by(f64::total_cmp);
    sorted
}

pub(crate) fn interpolate(sorted: &[f64], p: f64) -> f64 {
    match sorted.len() {
        0 => 0.0,
        1 => sorted[0],
        n => {
            let rank = (p.clamp(0.0, 100.0) / 100.0) * (n - 1) as f64;
            let lower = rank.floor() as usize;
            let upper = (lower + 1).min(n - 1);
            sorted[lower] + (rank - lower as f64) * (sorted[upper] - sorted[lower])
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_median() {
        assert!((percentile(&[5.0, 1.0, 3.0, 2.0, 4.0], 50.0) - 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_interpolation() {
        let samples: Vec<f64> = (1..=100).map(f64::from).collect();
        assert!((percentile(&samples, 25.0) - 25.75).abs() < 1e-9);
        assert!((percentile(&samples, 75.0) - 75.25).abs() < 1e-9);
    }

    #[test]
    fn test_degenerate_inputs() {
        assert_eq!(percentile(&[], 50.0), 0.0);
        assert_eq!(percentile(&[42.0], 99.0), 42.0);
        assert_eq!(percentile(&[1.0, 2.0], 250.0), 2.0);
    }

    #[test]
    fn test_percentile_set() {
        let samples: Vec<f64> = (1..=1000).map(f64::from).collect();
        let p = Percentiles::of(&samples);
        assert!(p.p50 > 499.0 && p.p50 < 502.0);
        assert!(p.p99 > 985.0 && p.p99 < 995.0);
        assert!(p.p75 < p.p90);
    }
}

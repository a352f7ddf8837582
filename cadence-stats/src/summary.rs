//! Summary Statistics
//!
//! Mean, variance, standard error and margin of error come from the samples
//! left after outlier removal. Extremes and percentiles come from every
//! sample.

use crate::outliers::{OutlierAnalysis, detect_outliers};
use crate::percentiles::Percentiles;
use crate::tdist::t_critical;
use serde::{Deserialize, Serialize};

/// Statistics of one set of timing samples
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    /// Arithmetic mean
    pub mean: f64,
    /// Sample standard deviation
    pub deviation: f64,
    /// Sample variance
    pub variance: f64,
    /// Standard error of the mean
    pub sem: f64,
    /// Margin of error at 95% confidence
    pub moe: f64,
    /// Margin of error relative to the mean, in percent
    pub rme: f64,
    /// Smallest sample
    pub min: f64,
    /// Largest sample
    pub max: f64,
    /// Tail percentiles
    pub percentiles: Percentiles,
    /// Number of samples, outliers included
    pub sample_count: usize,
    /// Number of samples outside the fences
    pub outlier_count: usize,
}

/// Summarize `samples`, excluding outliers beyond Tukey fence `fence` from
/// the central statistics.
pub fn summarize(samples: &[f64], fence: f64) -> Summary {
    if samples.is_empty() {
        return Summary::default();
    }

    let OutlierAnalysis { cleaned, low, high, .. } = detect_outliers(samples, fence);
    let central: &[f64] = if cleaned.is_empty() { samples } else { &cleaned };

    let n = central.len();
    let mean = central.iter().sum::<f64>() / n as f64;
    let variance = if n < 2 {
        0.0
    } else {
        central.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / (n - 1) as f64
    };
    let deviation = variance.sqrt();
    let sem = deviation / (n as f64).sqrt();
    let moe = if n < 2 { 0.0 } else { sem * t_critical(n - 1) };
    let rme = if mean == 0.0 { 0.0 } else { moe / mean * 100.0 };

    Summary {
        mean,
        deviation,
        variance,
        sem,
        moe,
        rme,
        min: samples.iter().copied().fold(f64::INFINITY, f64::min),
        max: samples.iter().copied().fold(f64::NEG_INFINITY, f64::max),
        percentiles: Percentiles::of(samples),
        sample_count: samples.len(),
        outlier_count: low + high,
    }
}

impl Summary {
    /// Operations per second implied by a mean in seconds
    pub fn hz(&self) -> f64 {
        if self.mean > 0.0 { 1.0 / self.mean } else { 0.0 }
    }

    /// Coefficient of variation, in percent
    pub fn coefficient_of_variation(&self) -> f64 {
        if self.mean == 0.0 {
            0.0
        } else {
            self.deviation / self.mean * 100.0
        }
    }
}

//! Outlier Detection
//!
//! Tukey fences: a sample is an outlier when it lies outside
//! `[Q1 - k * IQR, Q3 + k * IQR]`. Outliers are flagged, never discarded from
//! the raw set; only the central statistics use the cleaned samples.

use crate::percentiles::{interpolate, sorted};

/// Outcome of fence-based outlier detection
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OutlierAnalysis {
    /// Samples inside the fences, in input order
    pub cleaned: Vec<f64>,
    /// Samples below the lower fence
    pub low: usize,
    /// Samples above the upper fence
    pub high: usize,
    /// Lower fence
    pub lower_bound: f64,
    /// Upper fence
    pub upper_bound: f64,
}

impl OutlierAnalysis {
    /// Total outliers on both sides
    pub fn count(&self) -> usize {
        self.low + self.high
    }

    /// Share of samples flagged, as a percentage
    pub fn percentage(&self) -> f64 {
        let total = self.cleaned.len() + self.count();
        if total == 0 {
            0.0
        } else {
            self.count() as f64 / total as f64 * 100.0
        }
    }
}

/// Flag samples outside the Tukey fences with multiplier `k`
pub fn detect_outliers(samples: &[f64], k: f64) -> OutlierAnalysis {
    if samples.is_empty() {
        return OutlierAnalysis::default();
    }

    let ordered = sorted(samples);
    let q1 = interpolate(&ordered, 25.0);
    let q3 = interpolate(&ordered, 75.0);
    let iqr = q3 - q1;

    let mut analysis = OutlierAnalysis {
        cleaned: Vec::with_capacity(samples.len()),
        lower_bound: q1 - k * iqr,
        upper_bound: q3 + k * iqr,
        ..OutlierAnalysis::default()
    };

    for &sample in samples {
        if sample < analysis.lower_bound {
            analysis.low += 1;
        } else if sample > analysis.upper_bound {
            analysis.high += 1;
        } else {
            analysis.cleaned.push(sample);
        }
    }

    analysis
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DEFAULT_FENCE;

    #[test]
    fn test_no_outliers() {
        let analysis = detect_outliers(&[1.0, 2.0, 3.0, 4.0, 5.0], DEFAULT_FENCE);
        assert_eq!(analysis.count(), 0);
        assert_eq!(analysis.cleaned.len(), 5);
    }

    #[test]
    fn test_high_outlier() {
        let analysis = detect_outliers(&[1.0, 2.0, 3.0, 4.0, 5.0, 100.0], DEFAULT_FENCE);
        assert_eq!(analysis.high, 1);
        assert_eq!(analysis.low, 0);
        assert_eq!(analysis.cleaned, vec![1.0, 2.0, 3.0, 4.0, 5.0]);
        assert!(analysis.percentage() > 16.0 && analysis.percentage() < 17.0);
    }

    #[test]
    fn test_empty_samples() {
        let analysis = detect_outliers(&[], DEFAULT_FENCE);
        assert!(analysis.cleaned.is_empty());
        assert_eq!(analysis.percentage(), 0.0);
    }
}

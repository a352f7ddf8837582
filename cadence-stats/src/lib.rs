#![warn(missing_docs)]
//! Cadence Statistics
//!
//! Summary statistics for timing samples:
//! - Mean, deviation and margin of error from samples with outliers removed
//! - Extremes and percentiles from every sample, outliers included
//! - Tukey-fence (IQR) outlier detection
//! - Student's t critical values for 95% confidence intervals

mod outliers;
mod percentiles;
mod summary;
mod tdist;

pub use outliers::{OutlierAnalysis, detect_outliers};
pub use percentiles::{Percentiles, percentile};
pub use summary::{Summary, summarize};
pub use tdist::t_critical;

/// Default Tukey fence multiplier
pub const DEFAULT_FENCE: f64 = 1.5;

/// Confidence level used for margins of error
pub const CONFIDENCE_LEVEL: f64 = 0.95;

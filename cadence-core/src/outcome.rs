//! Measurement results as seen by hooks and reporters

use serde::{Deserialize, Serialize};

/// Summary statistics of one measured case, in seconds per operation
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Stats {
    /// Mean time per operation
    pub mean: f64,
    /// Sample standard deviation
    pub deviation: f64,
    /// Sample variance
    pub variance: f64,
    /// Standard error of the mean
    pub sem: f64,
    /// Margin of error at 95% confidence
    pub moe: f64,
    /// Relative margin of error, as a percentage of the mean
    pub rme: f64,
    /// Number of samples collected
    pub sample: usize,
}

/// Wall-clock bookkeeping of a measured case
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Times {
    /// Total time spent measuring, in seconds
    pub elapsed: f64,
    /// Mean time per operation, in seconds
    pub period: f64,
}

/// Descriptor produced by the measurement engine for a single case.
///
/// Hooks receive it at every lifecycle event; at `on_start` only `name` is
/// meaningful.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CaseReport {
    /// Fully-qualified case name
    pub name: String,
    /// Operations per second
    pub hz: f64,
    /// Iterations per sample in the last cycle
    pub count: u64,
    /// Number of timed cycles
    pub cycles: u32,
    /// Sample statistics
    pub stats: Stats,
    /// Timing bookkeeping
    pub times: Times,
    /// Measurement error, if the function failed while being timed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl CaseReport {
    /// Empty report for a case that has not been measured yet
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Whether measurement failed
    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}

/// What the middleware chain produced for a case
#[derive(Debug, Clone, PartialEq)]
pub enum CaseOutcome {
    /// The case ran to completion (possibly with a measurement error)
    Completed(CaseReport),
    /// A middleware declined to run the case
    Skipped,
}

impl CaseOutcome {
    /// The report, if the case ran
    pub fn report(&self) -> Option<&CaseReport> {
        match self {
            CaseOutcome::Completed(report) => Some(report),
            CaseOutcome::Skipped => None,
        }
    }
}

/// Totals for a finished run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    /// Cases that ran without a measurement error
    pub completed: usize,
    /// Cases skipped by middleware
    pub skipped: usize,
    /// Cases whose measurement failed
    pub errors: usize,
}

impl RunSummary {
    pub(crate) fn record(&mut self, outcome: &CaseOutcome) {
        match outcome {
            CaseOutcome::Completed(report) if report.is_error() => self.errors += 1,
            CaseOutcome::Completed(_) => self.completed += 1,
            CaseOutcome::Skipped => self.skipped += 1,
        }
    }

    /// Number of cases that ran, including failed ones
    pub fn ran(&self) -> usize {
        self.completed + self.errors
    }

    /// Whether every case that ran measured cleanly
    pub fn is_success(&self) -> bool {
        self.errors == 0
    }
}

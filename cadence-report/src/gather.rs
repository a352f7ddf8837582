//! In-memory collection

use cadence_core::{CaseReport, Reporter};
use parking_lot::Mutex;

/// Writes nothing; keeps every finished report for later inspection
#[derive(Debug, Default)]
pub struct GatherReporter {
    started: Mutex<Vec<String>>,
    results: Mutex<Vec<CaseReport>>,
    completions: Mutex<usize>,
}

impl GatherReporter {
    /// Empty collector
    pub fn new() -> Self {
        Self::default()
    }

    /// Names of cases whose measurement started, in order
    pub fn started(&self) -> Vec<String> {
        self.started.lock().clone()
    }

    /// Finished reports, in order
    pub fn results(&self) -> Vec<CaseReport> {
        self.results.lock().clone()
    }

    /// How many times the run was reported complete
    pub fn completions(&self) -> usize {
        *self.completions.lock()
    }
}

impl Reporter for GatherReporter {
    fn on_start_cycle(&self, report: &CaseReport) {
        self.started.lock().push(report.name.clone());
    }

    fn on_finish_cycle(&self, report: &CaseReport) {
        self.results.lock().push(report.clone());
    }

    fn on_complete(&self) {
        *self.completions.lock() += 1;
    }
}

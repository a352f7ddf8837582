//! Reporter interface

use crate::outcome::CaseReport;

/// Receives progress of a run.
///
/// `on_start_cycle` and `on_finish_cycle` bracket the measurement of every
/// case that is not skipped; `on_complete` is called once after the last case.
pub trait Reporter: Send + Sync {
    /// Measurement of a case is starting; only `report.name` is meaningful
    fn on_start_cycle(&self, report: &CaseReport);

    /// Measurement of a case has finished
    fn on_finish_cycle(&self, report: &CaseReport);

    /// All cases have been processed
    fn on_complete(&self);
}

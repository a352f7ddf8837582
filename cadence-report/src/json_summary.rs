//! Summarized JSON Output
//!
//! Collects every report and writes a single object when the run completes:
//! relative speed factors against the slowest case, the fastest case, errors
//! and total elapsed time.

use cadence_core::{CaseReport, Reporter};
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::io::{self, Write};

/// Per-case line of the summary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryResult {
    /// Case name
    pub name: String,
    /// Speed relative to the slowest successful case, to two decimals
    pub factor: f64,
    /// Whole operations per second
    pub ops: u64,
    /// Whether this is the fastest case
    pub fastest: bool,
}

/// A case whose measurement failed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryError {
    /// Case name
    pub name: String,
    /// Error message
    pub error: String,
}

/// The complete summary object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonSummary {
    /// Number of cases reported
    pub benches: usize,
    /// Failed cases
    pub errors: Vec<SummaryError>,
    /// Name of the fastest successful case
    pub fastest: Option<String>,
    /// Total measuring time in seconds, to two decimals
    pub elapsed: f64,
    /// Successful cases in run order
    pub results: Vec<SummaryResult>,
    /// When the summary was produced
    pub timestamp: DateTime<Utc>,
}

impl JsonSummary {
    /// Summarize `reports`
    pub fn from_reports(reports: &[CaseReport]) -> Self {
        let (failed, passed): (Vec<&CaseReport>, Vec<&CaseReport>) =
            reports.iter().partition(|r| r.is_error());

        let min_hz = passed.iter().map(|r| r.hz).fold(f64::INFINITY, f64::min);
        let max_hz = passed.iter().map(|r| r.hz).fold(0.0, f64::max);
        let fastest = passed.iter().find(|r| r.hz == max_hz).map(|r| r.name.clone());

        let mut marked = false;
        let results = passed
            .iter()
            .map(|r| {
                let is_fastest = !marked && r.hz == max_hz;
                marked |= is_fastest;
                SummaryResult {
                    name: r.name.clone(),
                    factor: round2(if min_hz > 0.0 { r.hz / min_hz } else { 0.0 }),
                    ops: r.hz.trunc() as u64,
                    fastest: is_fastest,
                }
            })
            .collect();

        Self {
            benches: reports.len(),
            errors: failed
                .iter()
                .map(|r| SummaryError {
                    name: r.name.clone(),
                    error: r.error.clone().unwrap_or_default(),
                })
                .collect(),
            fastest,
            elapsed: round2(reports.iter().map(|r| r.times.elapsed).sum()),
            results,
            timestamp: Utc::now(),
        }
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Writes a [`JsonSummary`] once every case has finished
pub struct JsonSummaryReporter<W: Write> {
    reports: Mutex<Vec<CaseReport>>,
    out: Mutex<W>,
}

impl<W: Write + Send> JsonSummaryReporter<W> {
    /// Write to `out`
    pub fn new(out: W) -> Self {
        Self {
            reports: Mutex::new(Vec::new()),
            out: Mutex::new(out),
        }
    }

    /// Return the underlying writer
    pub fn into_inner(self) -> W {
        self.out.into_inner()
    }

    fn write_summary(&self) -> io::Result<()> {
        let summary = JsonSummary::from_reports(&self.reports.lock());
        let mut out = self.out.lock();
        serde_json::to_writer(&mut *out, &summary)?;
        writeln!(out)?;
        out.flush()
    }
}

impl<W: Write + Send> Reporter for JsonSummaryReporter<W> {
    fn on_start_cycle(&self, _report: &CaseReport) {}

    fn on_finish_cycle(&self, report: &CaseReport) {
        self.reports.lock().push(report.clone());
    }

    fn on_complete(&self) {
        if let Err(err) = self.write_summary() {
            tracing::warn!(%err, "Failed to write JSON summary");
        }
    }
}

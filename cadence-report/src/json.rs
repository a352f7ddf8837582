//! JSON Output
//!
//! Entries are streamed as they finish, forming one JSON array once the run
//! completes.

use cadence_core::{CaseReport, Reporter};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::io::{self, Write};

/// One element of the output array
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonEntry {
    /// Case name
    pub name: String,
    /// Operations per second
    pub hz: f64,
    /// Mean seconds per operation
    pub mean: f64,
    /// Standard deviation in seconds
    pub deviation: f64,
    /// Iterations per sample
    pub count: u64,
    /// Measurement error, when the case failed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl From<&CaseReport> for JsonEntry {
    fn from(report: &CaseReport) -> Self {
        Self {
            name: report.name.clone(),
            hz: report.hz,
            mean: report.stats.mean,
            deviation: report.stats.deviation,
            count: report.count,
            error: report.error.clone(),
        }
    }
}

struct Stream<W> {
    out: W,
    printed: usize,
}

/// Streams a JSON array of [`JsonEntry`] values
pub struct JsonReporter<W: Write> {
    stream: Mutex<Stream<W>>,
}

impl<W: Write + Send> JsonReporter<W> {
    /// Write to `out`
    pub fn new(out: W) -> Self {
        Self {
            stream: Mutex::new(Stream { out, printed: 0 }),
        }
    }

    /// Return the underlying writer
    pub fn into_inner(self) -> W {
        self.stream.into_inner().out
    }

    fn write_entry(&self, entry: &JsonEntry) -> io::Result<()> {
        let mut stream = self.stream.lock();
        let lead = if stream.printed == 0 { '[' } else { ',' };
        let json = serde_json::to_string(entry)?;
        write!(stream.out, "{lead}\r\n  {json}")?;
        stream.printed += 1;
        stream.out.flush()
    }

    fn close(&self) -> io::Result<()> {
        let mut stream = self.stream.lock();
        if stream.printed == 0 {
            write!(stream.out, "[]\r\n")?;
        } else {
            write!(stream.out, "\r\n]\r\n")?;
        }
        stream.out.flush()
    }
}

impl<W: Write + Send> Reporter for JsonReporter<W> {
    fn on_start_cycle(&self, _report: &CaseReport) {}

    fn on_finish_cycle(&self, report: &CaseReport) {
        if let Err(err) = self.write_entry(&JsonEntry::from(report)) {
            tracing::warn!(%err, "Failed to write JSON entry");
        }
    }

    fn on_complete(&self) {
        if let Err(err) = self.close() {
            tracing::warn!(%err, "Failed to finish JSON output");
        }
    }
}

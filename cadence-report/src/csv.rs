//! CSV Output

use cadence_core::{CaseReport, Reporter};
use parking_lot::Mutex;
use std::io::{self, Write};

const HEADER: [&str; 5] = ["name", "hz", "mean", "deviation", "iterations"];

/// One CSV row per measured case. Cases whose measurement failed are left
/// out of the table and logged instead.
pub struct CsvReporter<W: Write> {
    writer: Mutex<csv::Writer<W>>,
}

impl<W: Write + Send> CsvReporter<W> {
    /// Write to `out`; the header row is written immediately
    pub fn new(out: W) -> Self {
        let mut writer = csv::WriterBuilder::new()
            .terminator(csv::Terminator::CRLF)
            .from_writer(out);
        if let Err(err) = write_header(&mut writer) {
            tracing::warn!(%err, "Failed to write CSV header");
        }
        Self {
            writer: Mutex::new(writer),
        }
    }

    /// Flush and return the underlying writer
    pub fn into_inner(self) -> io::Result<W> {
        self.writer
            .into_inner()
            .into_inner()
            .map_err(|err| err.into_error())
    }

    fn write_row(&self, report: &CaseReport) -> csv::Result<()> {
        let mut writer = self.writer.lock();
        writer.write_record([
            report.name.clone(),
            format!("{:.8}", report.hz),
            format!("{:.8}", report.stats.mean),
            format!("{:.8}", report.stats.deviation),
            report.count.to_string(),
        ])?;
        writer.flush()?;
        Ok(())
    }
}

fn write_header<W: Write>(writer: &mut csv::Writer<W>) -> csv::Result<()> {
    writer.write_record(HEADER)?;
    writer.flush()?;
    Ok(())
}

impl<W: Write + Send> Reporter for CsvReporter<W> {
    fn on_start_cycle(&self, _report: &CaseReport) {}

    fn on_finish_cycle(&self, report: &CaseReport) {
        if let Some(error) = &report.error {
            tracing::warn!(case = %report.name, %error, "Not written to CSV: measurement failed");
            return;
        }
        if let Err(err) = self.write_row(report) {
            tracing::warn!(%err, "Failed to write CSV row");
        }
    }

    fn on_complete(&self) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use cadence_core::Stats;

    fn report(name: &str, hz: f64) -> CaseReport {
        CaseReport {
            hz,
            count: 42,
            stats: Stats {
                mean: 1.0 / hz,
                deviation: 0.0,
                ..Stats::default()
            },
            ..CaseReport::named(name)
        }
    }

    #[test]
    fn test_rows() {
        let reporter = CsvReporter::new(Vec::new());
        reporter.on_finish_cycle(&report("plain", 4.0));
        reporter.on_finish_cycle(&report("with, comma", 2.0));
        reporter.on_finish_cycle(&CaseReport {
            error: Some("boom".to_string()),
            ..report("failed", 1.0)
        });

        let out = String::from_utf8(reporter.into_inner().unwrap()).unwrap();
        let lines: Vec<&str> = out.split("\r\n").collect();
        assert_eq!(lines[0], "name,hz,mean,deviation,iterations");
        assert_eq!(lines[1], "plain,4.00000000,0.25000000,0.00000000,42");
        assert_eq!(lines[2], "\"with, comma\",2.00000000,0.50000000,0.00000000,42");
        assert_eq!(lines[3], "");
        assert_eq!(lines.len(), 4);
    }
}

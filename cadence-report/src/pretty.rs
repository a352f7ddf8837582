//! Terminal output
//!
//! One line when a case starts, one line when it finishes, and a short
//! summary at the end. Relative speed is measured against the slowest case
//! finished so far.

use crate::format::format_significant;
use cadence_core::{CaseReport, Reporter};
use console::Style;
use parking_lot::Mutex;
use std::io::{self, Write};

/// Width the status column is right-aligned to
const CENTER: usize = 30;

/// Significant digits of every printed number
const DIGITS: u32 = 3;

struct State<W> {
    out: W,
    results: Vec<CaseReport>,
}

/// Human-readable progress and results
pub struct PrettyReporter<W: Write> {
    state: Mutex<State<W>>,
    colored: bool,
}

impl PrettyReporter<io::Stdout> {
    /// Write to stdout, colored when the terminal supports it
    pub fn stdout() -> Self {
        Self::new(io::stdout(), console::colors_enabled())
    }
}

impl<W: Write + Send> PrettyReporter<W> {
    /// Write to `out`, with or without ANSI colors
    pub fn new(out: W, colored: bool) -> Self {
        Self {
            state: Mutex::new(State {
                out,
                results: Vec::new(),
            }),
            colored,
        }
    }

    /// Return the underlying writer
    pub fn into_inner(self) -> W {
        self.state.into_inner().out
    }

    fn paint(&self, style: Style, text: impl AsRef<str>) -> String {
        let text = text.as_ref();
        if self.colored {
            style.force_styling(true).apply_to(text).to_string()
        } else {
            text.to_string()
        }
    }

    fn status(&self, style: Style, label: &str, name: &str) -> String {
        format!("{}{}", self.paint(style, format!("{label:>CENTER$}")), name)
    }

    fn started(&self, report: &CaseReport) -> io::Result<()> {
        let line = self.status(
            Style::new().yellow(),
            "running > ",
            &self.paint(Style::new().dim(), &report.name),
        );
        let mut state = self.state.lock();
        write!(state.out, "{line}\r\n")?;
        state.out.flush()
    }

    fn finished(&self, report: &CaseReport) -> io::Result<()> {
        let mut state = self.state.lock();
        state.results.push(report.clone());

        let line = if report.is_error() {
            self.status(
                Style::new().red(),
                "error > ",
                &self.paint(Style::new().dim(), &report.name),
            )
        } else {
            let min_hz = state
                .results
                .iter()
                .filter(|r| r.hz > 0.0)
                .map(|r| r.hz)
                .fold(f64::INFINITY, f64::min);
            let factor = if min_hz.is_finite() { report.hz / min_hz } else { 1.0 };
            let label = format!("{} ops/sec > ", format_significant(report.hz, DIGITS));
            let text = format!("{} ({}x)", report.name, format_significant(factor, DIGITS));
            self.status(Style::new().green(), &label, &text)
        };

        write!(state.out, "{line}\r\n")?;
        state.out.flush()
    }

    fn summary(&self) -> io::Result<()> {
        let mut state = self.state.lock();

        if let Some(failed) = state.results.iter().find(|r| r.is_error()) {
            let text = format!(
                "{}: {}\r\n",
                failed.name,
                failed.error.as_deref().unwrap_or_default()
            );
            let text = self.paint(Style::new().red(), text);
            write!(state.out, "{text}")?;
            return state.out.flush();
        }

        let benches = state.results.len();
        let fastest = state
            .results
            .iter()
            .max_by(|a, b| a.hz.total_cmp(&b.hz))
            .map(|r| r.name.clone())
            .unwrap_or_default();
        let elapsed: f64 = state.results.iter().map(|r| r.times.elapsed).sum();

        let lines = [
            ("Benches", benches.to_string()),
            ("Fastest", fastest),
            ("Elapsed", format!("{}s", format_significant(elapsed, DIGITS))),
        ];
        write!(state.out, "\r\n")?;
        for (key, value) in lines {
            let key = self.paint(Style::new().dim(), key);
            write!(state.out, "  {key}: {value}\r\n")?;
        }
        write!(state.out, "\r\n")?;
        state.out.flush()
    }
}

impl<W: Write + Send> Reporter for PrettyReporter<W> {
    fn on_start_cycle(&self, report: &CaseReport) {
        if let Err(err) = self.started(report) {
            tracing::warn!(%err, "Failed to write progress");
        }
    }

    fn on_finish_cycle(&self, report: &CaseReport) {
        if let Err(err) = self.finished(report) {
            tracing::warn!(%err, "Failed to write result");
        }
    }

    fn on_complete(&self) {
        if let Err(err) = self.summary() {
            tracing::warn!(%err, "Failed to write summary");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cadence_core::Times;

    fn report(name: &str, hz: f64, elapsed: f64) -> CaseReport {
        CaseReport {
            hz,
            times: Times {
                elapsed,
                period: 1.0 / hz,
            },
            ..CaseReport::named(name)
        }
    }

    fn output(reporter: PrettyReporter<Vec<u8>>) -> Vec<String> {
        String::from_utf8(reporter.into_inner())
            .unwrap()
            .split("\r\n")
            .map(str::to_string)
            .collect()
    }

    #[test]
    fn test_progress_and_summary() {
        let reporter = PrettyReporter::new(Vec::new(), false);
        let slow = report("slow", 1200.0, 1.25);
        let fast = report("fast", 3000.0, 1.0);

        reporter.on_start_cycle(&slow);
        reporter.on_finish_cycle(&slow);
        reporter.on_start_cycle(&fast);
        reporter.on_finish_cycle(&fast);
        reporter.on_complete();

        let lines = output(reporter);
        assert_eq!(lines[0], format!("{:>30}slow", "running > "));
        assert_eq!(lines[1], format!("{:>30}slow (1x)", "1,200 ops/sec > "));
        assert_eq!(lines[3], format!("{:>30}fast (2.5x)", "3,000 ops/sec > "));
        assert_eq!(lines[5], "  Benches: 2");
        assert_eq!(lines[6], "  Fastest: fast");
        assert_eq!(lines[7], "  Elapsed: 2.25s");
    }

    #[test]
    fn test_error_replaces_summary() {
        let reporter = PrettyReporter::new(Vec::new(), false);
        let broken = CaseReport {
            error: Some("boom".to_string()),
            ..CaseReport::named("broken")
        };

        reporter.on_finish_cycle(&broken);
        reporter.on_complete();

        let lines = output(reporter);
        assert_eq!(lines[0], format!("{:>30}broken", "error > "));
        assert_eq!(lines[1], "broken: boom");
        assert!(!lines.iter().any(|l| l.contains("Benches")));
    }

    #[test]
    fn test_colored_output_has_escapes() {
        let reporter = PrettyReporter::new(Vec::new(), true);
        reporter.on_start_cycle(&CaseReport::named("x"));
        let text = String::from_utf8(reporter.into_inner()).unwrap();
        assert!(text.contains('\u{1b}'));
    }
}

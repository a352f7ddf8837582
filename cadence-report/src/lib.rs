#![warn(missing_docs)]
//! Cadence Report - Result Reporters
//!
//! Renders run progress and results:
//! - `pretty`: colored terminal lines with relative speed (default)
//! - `csv`: one row per case
//! - `json`: a streamed array of per-case entries
//! - `json-summary`: a single object with relative factors and the fastest case
//! - [`GatherReporter`]: keeps reports in memory, for tests and embedding
//!
//! Reporters selectable by name are listed in [`REPORTERS`].

mod csv;
mod format;
mod gather;
mod json;
mod json_summary;
mod pretty;

pub use crate::csv::CsvReporter;
pub use format::format_significant;
pub use gather::GatherReporter;
pub use json::{JsonEntry, JsonReporter};
pub use json_summary::{JsonSummary, JsonSummaryReporter, SummaryError, SummaryResult};
pub use pretty::PrettyReporter;

use cadence_core::Reporter;
use std::sync::Arc;

/// Name of the reporter used when none is chosen
pub const DEFAULT_REPORTER: &str = "pretty";

/// A reporter selectable by name
#[derive(Debug, Clone, Copy)]
pub struct ReporterFactory {
    /// Name used on the command line and in configuration
    pub name: &'static str,
    /// One-line description for listings
    pub description: &'static str,
    /// Create the reporter, writing to stdout
    pub start: fn() -> Arc<dyn Reporter>,
}

/// Every named reporter
pub static REPORTERS: &[ReporterFactory] = &[
    ReporterFactory {
        name: "csv",
        description: "Outputs stats as CSV",
        start: || Arc::new(CsvReporter::new(std::io::stdout())),
    },
    ReporterFactory {
        name: "json",
        description: "Outputs stats as raw JSON",
        start: || Arc::new(JsonReporter::new(std::io::stdout())),
    },
    ReporterFactory {
        name: "json-summary",
        description: "Outputs summarized stats as raw JSON",
        start: || Arc::new(JsonSummaryReporter::new(std::io::stdout())),
    },
    ReporterFactory {
        name: "pretty",
        description: "Pretty prints results to the console",
        start: || Arc::new(PrettyReporter::stdout()),
    },
];

/// Look up a reporter by name, ignoring case
pub fn find_reporter(name: &str) -> Option<&'static ReporterFactory> {
    REPORTERS
        .iter()
        .find(|factory| factory.name.eq_ignore_ascii_case(name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_reporter_is_registered() {
        assert!(find_reporter(DEFAULT_REPORTER).is_some());
    }

    #[test]
    fn test_lookup() {
        assert_eq!(find_reporter("JSON-Summary").map(|f| f.name), Some("json-summary"));
        assert!(find_reporter("html").is_none());
    }

    #[test]
    fn test_names_are_unique() {
        let mut names: Vec<_> = REPORTERS.iter().map(|f| f.name).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), REPORTERS.len());
    }
}

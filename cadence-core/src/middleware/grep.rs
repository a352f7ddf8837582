//! Name filtering

use crate::case::BenchCase;
use crate::error::{BenchError, PatternError};
use crate::outcome::CaseOutcome;
use crate::pipeline::{Middleware, Next};
use futures::future::{self, BoxFuture};
use regex::{Regex, RegexBuilder};
use std::fmt;

/// Case-insensitive name filter
#[derive(Clone)]
pub enum NamePattern {
    /// Plain substring, stored lowercased
    Substring(String),
    /// Regular expression, matched anywhere in the name
    Regex(Regex),
}

impl NamePattern {
    /// Match names containing `needle`, ignoring case
    pub fn substring(needle: impl AsRef<str>) -> Self {
        NamePattern::Substring(needle.as_ref().to_lowercase())
    }

    /// Compile a case-insensitive regular expression
    pub fn regex(pattern: &str) -> Result<Self, PatternError> {
        RegexBuilder::new(pattern)
            .case_insensitive(true)
            .build()
            .map(NamePattern::Regex)
            .map_err(|source| PatternError {
                pattern: pattern.to_string(),
                source,
            })
    }

    /// Whether `name` passes the filter
    pub fn matches(&self, name: &str) -> bool {
        match self {
            NamePattern::Substring(needle) => name.to_lowercase().contains(needle.as_str()),
            NamePattern::Regex(re) => re.is_match(name),
        }
    }
}

impl From<Regex> for NamePattern {
    fn from(re: Regex) -> Self {
        NamePattern::Regex(re)
    }
}

impl fmt::Debug for NamePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NamePattern::Substring(s) => f.debug_tuple("Substring").field(s).finish(),
            NamePattern::Regex(re) => f.debug_tuple("Regex").field(&re.as_str()).finish(),
        }
    }
}

/// Skips cases whose name does not match
#[derive(Debug, Clone)]
pub struct GrepMiddleware {
    pattern: NamePattern,
}

impl GrepMiddleware {
    /// Filter on `pattern`
    pub fn new(pattern: NamePattern) -> Self {
        Self { pattern }
    }
}

impl Middleware for GrepMiddleware {
    fn handle<'a>(
        &'a self,
        case: BenchCase,
        next: Next<'a>,
    ) -> BoxFuture<'a, Result<CaseOutcome, BenchError>> {
        if self.pattern.matches(case.name()) {
            next.run(case)
        } else {
            tracing::debug!(case = case.name(), "Filtered out");
            Box::pin(future::ready(Ok(CaseOutcome::Skipped)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn substring_ignores_case() {
        let pattern = NamePattern::substring("Sort");
        assert!(pattern.matches("arrays#quicksort"));
        assert!(pattern.matches("SORTING"));
        assert!(!pattern.matches("arrays#reverse"));
    }

    #[test]
    fn regex_ignores_case_and_matches_anywhere() {
        let pattern = NamePattern::regex("^a#.*b$").unwrap();
        assert!(pattern.matches("a#b"));
        assert!(pattern.matches("A#xxB"));
        assert!(!pattern.matches("b#a"));
    }

    #[test]
    fn empty_patterns_match_everything() {
        assert!(NamePattern::substring("").matches("anything"));
        assert!(NamePattern::regex("").unwrap().matches("anything"));
    }

    #[test]
    fn malformed_regex_names_the_pattern() {
        let err = NamePattern::regex("(unclosed").unwrap_err();
        assert_eq!(err.pattern, "(unclosed");
        assert!(err.to_string().starts_with("invalid name pattern `(unclosed`"));
    }
}

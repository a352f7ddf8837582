//! Error types for the execution engine

use std::any::Any;
use thiserror::Error;

/// Error type accepted from user benchmark and lifecycle functions
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Failure of a single setup, benchmark or teardown invocation
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BenchError {
    /// The function returned an error or completed its callback with one
    #[error("{0}")]
    Failed(String),

    /// The function panicked
    #[error("panicked: {0}")]
    Panicked(String),

    /// A callback-style function dropped its completion handle without signalling
    #[error("completion handle dropped before the function signalled completion")]
    Abandoned,
}

impl BenchError {
    /// Wrap an error raised by user code
    pub fn from_user(err: BoxError) -> Self {
        BenchError::Failed(err.to_string())
    }

    pub(crate) fn from_panic(panic: Box<dyn Any + Send>) -> Self {
        BenchError::Panicked(panic_message(panic.as_ref()))
    }
}

/// Error that aborted a whole run
#[derive(Debug, Error)]
pub enum RunError {
    /// A case failed outside of measurement (setup, teardown, middleware or engine)
    #[error("case `{name}` failed: {source}")]
    Case {
        /// Fully-qualified case name
        name: String,
        /// Underlying failure
        #[source]
        source: BenchError,
    },
}

/// Errors from building an [`Options`](crate::Options) record out of an untyped table
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OptionsError {
    /// A recognized key holds a value of the wrong type
    #[error("option `{key}` expects {expected}")]
    InvalidValue {
        /// Offending key
        key: &'static str,
        /// Description of the accepted values
        expected: &'static str,
    },

    /// A duration string could not be parsed
    #[error("invalid duration `{0}`")]
    InvalidDuration(String),

    /// A function-valued key appeared in a table
    #[error("option `{0}` holds a function and cannot be set from configuration")]
    NotConfigurable(&'static str),
}

/// Malformed name filter
#[derive(Debug, Error)]
#[error("invalid name pattern `{pattern}`: {source}")]
pub struct PatternError {
    /// The pattern as given
    pub pattern: String,
    /// Regex compilation failure
    #[source]
    pub source: regex::Error,
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "Unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn panic_payloads_are_readable() {
        let err = BenchError::from_panic(Box::new("boom"));
        assert_eq!(err, BenchError::Panicked("boom".to_string()));

        let err = BenchError::from_panic(Box::new(String::from("owned")));
        assert_eq!(err.to_string(), "panicked: owned");

        let err = BenchError::from_panic(Box::new(42_u8));
        assert_eq!(err, BenchError::Panicked("Unknown panic".to_string()));
    }

    #[test]
    fn run_error_names_the_case() {
        let err = RunError::Case {
            name: "a#b".to_string(),
            source: BenchError::Failed("setup exploded".to_string()),
        };
        assert_eq!(err.to_string(), "case `a#b` failed: setup exploded");
    }
}

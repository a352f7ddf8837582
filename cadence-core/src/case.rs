//! Registered benchmark cases

use crate::options::Options;
use crate::pipeline::MiddlewareStack;
use crate::task::BenchFn;
use std::fmt;

/// A named unit of benchmarked work, ready for execution.
///
/// Created once at registration and consumed once by the engine. Middleware
/// that wants different options derives a new case with
/// [`with_options`](BenchCase::with_options).
#[derive(Clone)]
pub struct BenchCase {
    name: String,
    func: BenchFn,
    middleware: MiddlewareStack,
    options: Options,
}

impl BenchCase {
    /// Assemble a case
    pub fn new(
        name: impl Into<String>,
        func: BenchFn,
        middleware: MiddlewareStack,
        options: Options,
    ) -> Self {
        Self {
            name: name.into(),
            func,
            middleware,
            options,
        }
    }

    /// Fully-qualified name, scopes joined with `#`
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The function being measured
    pub fn func(&self) -> &BenchFn {
        &self.func
    }

    /// Interceptors wrapping this case, outermost first
    pub fn middleware(&self) -> &MiddlewareStack {
        &self.middleware
    }

    /// Effective options after scope merging
    pub fn options(&self) -> &Options {
        &self.options
    }

    /// Same case with different options
    pub fn with_options(self, options: Options) -> Self {
        Self { options, ..self }
    }
}

impl fmt::Debug for BenchCase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BenchCase")
            .field("name", &self.name)
            .field("func", &self.func)
            .field("middleware", &self.middleware.len())
            .field("options", &self.options)
            .finish()
    }
}

//! Execution Engine
//!
//! [`benchmark`] runs the prepare callback against a fresh [`Suite`], then
//! pushes every registered case through its middleware chain, one case at a
//! time and in registration order. The terminal stage of each chain runs
//! setup, hands the case to the [`RunFunction`], and runs teardown.

use crate::bencher::Sampler;
use crate::case::BenchCase;
use crate::error::{BenchError, RunError};
use crate::middleware::{NamePattern, ReporterMiddleware};
use crate::options::{OptionKey, Options};
use crate::outcome::{CaseOutcome, RunSummary};
use crate::pipeline::{Middleware, MiddlewareStack, Next, RunFunction, Terminal};
use crate::reporter::Reporter;
use crate::suite::Suite;
use futures::future::{self, BoxFuture, FutureExt};
use std::future::Future;
use std::sync::Arc;

type Prepare = Box<dyn FnOnce(Suite) -> BoxFuture<'static, ()> + Send>;

/// Everything [`benchmark`] needs for one run
pub struct BenchmarkOptions {
    prepare: Prepare,
    reporter: Arc<dyn Reporter>,
    middleware: Vec<Arc<dyn Middleware>>,
    run_function: Arc<dyn RunFunction>,
    grep: Option<NamePattern>,
    defaults: Options,
}

impl BenchmarkOptions {
    /// Run with a synchronous registration callback
    pub fn new<F>(reporter: Arc<dyn Reporter>, prepare: F) -> Self
    where
        F: FnOnce(&Suite) + Send + 'static,
    {
        Self::with_prepare(
            reporter,
            Box::new(move |suite: Suite| {
                prepare(&suite);
                future::ready(()).boxed()
            }),
        )
    }

    /// Run with a registration callback that finishes asynchronously
    pub fn new_async<F, Fut>(reporter: Arc<dyn Reporter>, prepare: F) -> Self
    where
        F: FnOnce(Suite) -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        Self::with_prepare(reporter, Box::new(move |suite: Suite| prepare(suite).boxed()))
    }

    fn with_prepare(reporter: Arc<dyn Reporter>, prepare: Prepare) -> Self {
        Self {
            prepare,
            reporter,
            middleware: Vec::new(),
            run_function: Arc::new(Sampler::new()),
            grep: None,
            defaults: Options::new(),
        }
    }

    /// Append a root middleware; earlier middleware wraps later middleware
    pub fn middleware(mut self, middleware: impl Middleware + 'static) -> Self {
        self.middleware.push(Arc::new(middleware));
        self
    }

    /// Append an already shared root middleware
    pub fn shared_middleware(mut self, middleware: Arc<dyn Middleware>) -> Self {
        self.middleware.push(middleware);
        self
    }

    /// Replace the measurement engine
    pub fn run_function(mut self, run_function: impl RunFunction + 'static) -> Self {
        self.run_function = Arc::new(run_function);
        self
    }

    /// Only register cases whose full name matches
    pub fn grep(mut self, pattern: NamePattern) -> Self {
        self.grep = Some(pattern);
        self
    }

    /// Options every case inherits from the root scope
    pub fn defaults(mut self, defaults: Options) -> Self {
        self.defaults = defaults;
        self
    }
}

/// Register and run all cases, returning totals once the reporter has been
/// told the run is complete.
///
/// A failing setup, teardown, engine or middleware aborts the run. Failures
/// of the measured function itself are carried on its report instead.
pub async fn benchmark(options: BenchmarkOptions) -> Result<RunSummary, RunError> {
    let BenchmarkOptions {
        prepare,
        reporter,
        mut middleware,
        run_function,
        grep,
        defaults,
    } = options;

    middleware.push(Arc::new(ReporterMiddleware::new(Arc::clone(&reporter))));
    let stack: MiddlewareStack = Arc::from(middleware);

    let suite = Suite::with_root(stack, defaults, grep);
    prepare(suite.clone()).await;
    let cases = suite.into_cases();
    tracing::debug!(cases = cases.len(), "Registration finished");

    let executor = Executor { run_function };
    let summary = run_cases(cases, &executor).await?;

    reporter.on_complete();
    tracing::info!(
        completed = summary.completed,
        skipped = summary.skipped,
        errors = summary.errors,
        "Run finished"
    );
    Ok(summary)
}

async fn run_cases(cases: Vec<BenchCase>, executor: &Executor) -> Result<RunSummary, RunError> {
    let mut summary = RunSummary::default();

    for case in cases {
        let name = case.name().to_string();
        let chain = Arc::clone(case.middleware());
        tracing::debug!(case = %name, "Starting");

        let outcome = Next::new(&chain, executor)
            .run(case)
            .await
            .map_err(|source| RunError::Case {
                name: name.clone(),
                source,
            })?;

        if outcome == CaseOutcome::Skipped {
            tracing::debug!(case = %name, "Skipped");
        }
        summary.record(&outcome);
    }

    Ok(summary)
}

/// Terminal stage: setup, measurement, teardown
struct Executor {
    run_function: Arc<dyn RunFunction>,
}

impl Executor {
    async fn execute_case(&self, case: BenchCase) -> Result<CaseOutcome, BenchError> {
        let options = case.options();

        if let Some(setup) = options.setup() {
            setup.run().await?;
        }

        let engine_options = options
            .strip(&OptionKey::INTERNAL)
            .with_run(case.func().clone());
        let measured = self
            .run_function
            .run(case.name().to_string(), engine_options)
            .await;

        let torn_down = match options.teardown() {
            Some(teardown) => teardown.run().await,
            None => Ok(()),
        };

        let report = measured?;
        torn_down?;

        if let Some(error) = &report.error {
            tracing::warn!(case = %report.name, %error, "Measurement failed");
        }
        Ok(CaseOutcome::Completed(report))
    }
}

impl Terminal for Executor {
    fn execute(&self, case: BenchCase) -> BoxFuture<'_, Result<CaseOutcome, BenchError>> {
        self.execute_case(case).boxed()
    }
}

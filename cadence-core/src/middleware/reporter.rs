//! Reporter instrumentation

use crate::case::BenchCase;
use crate::error::BenchError;
use crate::options::Options;
use crate::outcome::CaseOutcome;
use crate::pipeline::{Middleware, Next};
use crate::reporter::Reporter;
use futures::future::BoxFuture;
use std::sync::Arc;

/// Chains reporter notifications onto each case's `on_start` and
/// `on_complete` hooks, keeping any hooks the case already has.
#[derive(Clone)]
pub struct ReporterMiddleware {
    reporter: Arc<dyn Reporter>,
}

impl ReporterMiddleware {
    /// Notify `reporter`
    pub fn new(reporter: Arc<dyn Reporter>) -> Self {
        Self { reporter }
    }
}

impl Middleware for ReporterMiddleware {
    fn handle<'a>(
        &'a self,
        case: BenchCase,
        next: Next<'a>,
    ) -> BoxFuture<'a, Result<CaseOutcome, BenchError>> {
        let (start, finish) = (Arc::clone(&self.reporter), Arc::clone(&self.reporter));
        let hooks = Options::new()
            .on_start(move |report| start.on_start_cycle(report))
            .on_complete(move |report| finish.on_finish_cycle(report));

        let options = case.options().merge(&hooks);
        next.run(case.with_options(options))
    }
}

//! Middleware Pipeline
//!
//! Each case runs through its middleware chain, outermost first. A middleware
//! receives the case and a [`Next`] continuation; it may skip the case, run it
//! once through `next`, or wrap that call with its own work. After the last
//! middleware comes the terminal stage (setup, measurement, teardown).

use crate::case::BenchCase;
use crate::error::BenchError;
use crate::options::Options;
use crate::outcome::{CaseOutcome, CaseReport};
use futures::future::{BoxFuture, FutureExt};
use std::future::Future;
use std::sync::Arc;

/// Shared, ordered list of interceptors
pub type MiddlewareStack = Arc<[Arc<dyn Middleware>]>;

/// Interceptor wrapped around the execution of a case
pub trait Middleware: Send + Sync {
    /// Process `case`, usually by calling `next.run(case)` exactly once
    fn handle<'a>(
        &'a self,
        case: BenchCase,
        next: Next<'a>,
    ) -> BoxFuture<'a, Result<CaseOutcome, BenchError>>;
}

/// Final stage after the last middleware
pub(crate) trait Terminal: Send + Sync {
    fn execute(&self, case: BenchCase) -> BoxFuture<'_, Result<CaseOutcome, BenchError>>;
}

/// The rest of the chain, consumed by calling [`run`](Next::run)
pub struct Next<'a> {
    chain: &'a [Arc<dyn Middleware>],
    terminal: &'a dyn Terminal,
}

impl<'a> Next<'a> {
    pub(crate) fn new(chain: &'a [Arc<dyn Middleware>], terminal: &'a dyn Terminal) -> Self {
        Self { chain, terminal }
    }

    /// Hand the case to the next middleware, or to the terminal stage
    pub fn run(self, case: BenchCase) -> BoxFuture<'a, Result<CaseOutcome, BenchError>> {
        match self.chain.split_first() {
            Some((head, rest)) => head.handle(case, Next::new(rest, self.terminal)),
            None => self.terminal.execute(case),
        }
    }

    /// Middleware still ahead, not counting the terminal stage
    pub fn remaining(&self) -> usize {
        self.chain.len()
    }
}

/// Measurement engine: times the function installed under `run` in `options`
pub trait RunFunction: Send + Sync {
    /// Measure one case
    fn run(&self, name: String, options: Options) -> BoxFuture<'_, Result<CaseReport, BenchError>>;
}

impl<F, Fut> RunFunction for F
where
    F: Fn(String, Options) -> Fut + Send + Sync,
    Fut: Future<Output = Result<CaseReport, BenchError>> + Send + 'static,
{
    fn run(&self, name: String, options: Options) -> BoxFuture<'_, Result<CaseReport, BenchError>> {
        self(name, options).boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::BenchFn;
    use parking_lot::Mutex;

    struct Recording {
        label: &'static str,
        log: Arc<Mutex<Vec<String>>>,
    }

    impl Middleware for Recording {
        fn handle<'a>(
            &'a self,
            case: BenchCase,
            next: Next<'a>,
        ) -> BoxFuture<'a, Result<CaseOutcome, BenchError>> {
            async move {
                self.log.lock().push(format!("enter {}", self.label));
                let outcome = next.run(case).await;
                self.log.lock().push(format!("leave {}", self.label));
                outcome
            }
            .boxed()
        }
    }

    struct Skip;

    impl Middleware for Skip {
        fn handle<'a>(
            &'a self,
            _case: BenchCase,
            _next: Next<'a>,
        ) -> BoxFuture<'a, Result<CaseOutcome, BenchError>> {
            futures::future::ready(Ok(CaseOutcome::Skipped)).boxed()
        }
    }

    struct Terminus {
        log: Arc<Mutex<Vec<String>>>,
    }

    impl Terminal for Terminus {
        fn execute(&self, case: BenchCase) -> BoxFuture<'_, Result<CaseOutcome, BenchError>> {
            async move {
                self.log.lock().push(format!("run {}", case.name()));
                Ok(CaseOutcome::Completed(CaseReport::named(case.name())))
            }
            .boxed()
        }
    }

    fn case(name: &str, middleware: MiddlewareStack) -> BenchCase {
        BenchCase::new(name, BenchFn::noop(), middleware, Options::new())
    }

    #[tokio::test]
    async fn middleware_wraps_in_order() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let stack: MiddlewareStack = Arc::from(vec![
            Arc::new(Recording { label: "outer", log: Arc::clone(&log) }) as Arc<dyn Middleware>,
            Arc::new(Recording { label: "inner", log: Arc::clone(&log) }),
        ]);
        let terminal = Terminus { log: Arc::clone(&log) };

        let outcome = Next::new(&stack, &terminal).run(case("x", stack.clone())).await.unwrap();

        assert_eq!(outcome.report().map(|r| r.name.as_str()), Some("x"));
        assert_eq!(
            *log.lock(),
            vec!["enter outer", "enter inner", "run x", "leave inner", "leave outer"]
        );
    }

    #[tokio::test]
    async fn declining_middleware_stops_the_chain() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let stack: MiddlewareStack = Arc::from(vec![
            Arc::new(Skip) as Arc<dyn Middleware>,
            Arc::new(Recording { label: "never", log: Arc::clone(&log) }),
        ]);
        let terminal = Terminus { log: Arc::clone(&log) };

        let outcome = Next::new(&stack, &terminal).run(case("x", stack.clone())).await.unwrap();

        assert_eq!(outcome, CaseOutcome::Skipped);
        assert!(log.lock().is_empty());
    }

    #[tokio::test]
    async fn closures_are_run_functions() {
        let engine = |name: String, options: Options| async move {
            Ok::<_, BenchError>(CaseReport {
                count: options.init_count().unwrap_or(0),
                ..CaseReport::named(name)
            })
        };

        let report = engine
            .run("closure".to_string(), Options::new().with_init_count(3))
            .await
            .unwrap();
        assert_eq!(report.name, "closure");
        assert_eq!(report.count, 3);
    }
}

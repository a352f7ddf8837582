//! Profiling around case execution
//!
//! [`ProfileMiddleware`] creates its [`ProfileSession`] on first use, enables
//! it exactly once, then brackets every matching case with `start`/`stop`.
//! Captured profiles go to a [`ProfileSink`].

use super::grep::NamePattern;
use crate::case::BenchCase;
use crate::error::BenchError;
use crate::measure::Timer;
use crate::outcome::CaseOutcome;
use crate::pipeline::{Middleware, Next};
use futures::future::{self, BoxFuture, FutureExt};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::OnceCell;

/// Data captured between `start` and `stop`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    /// Wall-clock time in nanoseconds
    pub wall_ns: u64,
    /// CPU cycles (0 where no cycle counter is available)
    pub cycles: u64,
}

/// A profiler that can be switched on once and then capture repeatedly
pub trait ProfileSession: Send + Sync {
    /// One-time activation, before the first capture
    fn enable(&self) -> BoxFuture<'_, Result<(), BenchError>>;

    /// Begin a capture
    fn start(&self) -> BoxFuture<'_, Result<(), BenchError>>;

    /// End the current capture
    fn stop(&self) -> BoxFuture<'_, Result<Profile, BenchError>>;
}

/// Session measuring wall time and cycle counts
#[derive(Default)]
pub struct WallClockSession {
    running: Mutex<Option<Timer>>,
}

impl WallClockSession {
    /// Idle session
    pub fn new() -> Self {
        Self::default()
    }
}

impl ProfileSession for WallClockSession {
    fn enable(&self) -> BoxFuture<'_, Result<(), BenchError>> {
        future::ready(Ok(())).boxed()
    }

    fn start(&self) -> BoxFuture<'_, Result<(), BenchError>> {
        *self.running.lock() = Some(Timer::start());
        future::ready(Ok(())).boxed()
    }

    fn stop(&self) -> BoxFuture<'_, Result<Profile, BenchError>> {
        let result = match self.running.lock().take() {
            Some(timer) => {
                let (wall_ns, cycles) = timer.stop();
                Ok(Profile { wall_ns, cycles })
            }
            None => Err(BenchError::Failed("profiler stopped before it was started".to_string())),
        };
        future::ready(result).boxed()
    }
}

/// Destination for captured profiles
pub trait ProfileSink: Send + Sync {
    /// Store the profile of `case`
    fn record(&self, case: &BenchCase, profile: Profile) -> Result<(), BenchError>;
}

impl<F> ProfileSink for F
where
    F: Fn(&BenchCase, Profile) + Send + Sync,
{
    fn record(&self, case: &BenchCase, profile: Profile) -> Result<(), BenchError> {
        self(case, profile);
        Ok(())
    }
}

type SessionFactory = Box<dyn Fn() -> Arc<dyn ProfileSession> + Send + Sync>;

/// Profiles every case, or only those matching an include pattern
pub struct ProfileMiddleware {
    factory: SessionFactory,
    session: OnceCell<Arc<dyn ProfileSession>>,
    sink: Arc<dyn ProfileSink>,
    include: Option<NamePattern>,
}

impl ProfileMiddleware {
    /// Profile with sessions produced by `factory`, created lazily
    pub fn new<F>(factory: F, sink: Arc<dyn ProfileSink>) -> Self
    where
        F: Fn() -> Arc<dyn ProfileSession> + Send + Sync + 'static,
    {
        Self {
            factory: Box::new(factory),
            session: OnceCell::new(),
            sink,
            include: None,
        }
    }

    /// Profile with a [`WallClockSession`]
    pub fn wall_clock(sink: Arc<dyn ProfileSink>) -> Self {
        Self::new(|| Arc::new(WallClockSession::new()), sink)
    }

    /// Only profile cases matching `pattern`; others pass through untouched
    pub fn include(mut self, pattern: NamePattern) -> Self {
        self.include = Some(pattern);
        self
    }

    async fn session(&self) -> Result<&Arc<dyn ProfileSession>, BenchError> {
        self.session
            .get_or_try_init(|| async {
                let session = (self.factory)();
                session.enable().await?;
                tracing::debug!("Profiler enabled");
                Ok(session)
            })
            .await
    }
}

impl Middleware for ProfileMiddleware {
    fn handle<'a>(
        &'a self,
        case: BenchCase,
        next: Next<'a>,
    ) -> BoxFuture<'a, Result<CaseOutcome, BenchError>> {
        if let Some(pattern) = &self.include {
            if !pattern.matches(case.name()) {
                return next.run(case);
            }
        }

        async move {
            let session = self.session().await?;
            let profiled = case.clone();

            session.start().await?;
            let outcome = next.run(case).await;
            let profile = session.stop().await?;
            let outcome = outcome?;

            self.sink.record(&profiled, profile)?;
            Ok(outcome)
        }
        .boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::Options;
    use crate::outcome::CaseReport;
    use crate::pipeline::{MiddlewareStack, Terminal};
    use crate::task::BenchFn;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct CountingSession {
        enabled: AtomicUsize,
        started: AtomicUsize,
        stopped: AtomicUsize,
    }

    impl ProfileSession for CountingSession {
        fn enable(&self) -> BoxFuture<'_, Result<(), BenchError>> {
            self.enabled.fetch_add(1, Ordering::SeqCst);
            future::ready(Ok(())).boxed()
        }

        fn start(&self) -> BoxFuture<'_, Result<(), BenchError>> {
            self.started.fetch_add(1, Ordering::SeqCst);
            future::ready(Ok(())).boxed()
        }

        fn stop(&self) -> BoxFuture<'_, Result<Profile, BenchError>> {
            let n = self.stopped.fetch_add(1, Ordering::SeqCst) as u64;
            future::ready(Ok(Profile { wall_ns: n, cycles: 0 })).boxed()
        }
    }

    struct Measure;

    impl Terminal for Measure {
        fn execute(&self, case: BenchCase) -> BoxFuture<'_, Result<CaseOutcome, BenchError>> {
            future::ready(Ok(CaseOutcome::Completed(CaseReport::named(case.name())))).boxed()
        }
    }

    async fn run(middleware: &ProfileMiddleware, name: &str) {
        let stack: MiddlewareStack = Arc::from(Vec::<Arc<dyn crate::pipeline::Middleware>>::new());
        let case = BenchCase::new(name, BenchFn::noop(), stack, Options::new());
        middleware
            .handle(case, Next::new(&[], &Measure))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn enables_once_and_captures_matching_cases() {
        let session = Arc::new(CountingSession::default());
        let recorded = Arc::new(Mutex::new(Vec::new()));

        let shared = Arc::clone(&session);
        let sink = Arc::clone(&recorded);
        let middleware = ProfileMiddleware::new(
            move || Arc::clone(&shared) as Arc<dyn ProfileSession>,
            Arc::new(move |case: &BenchCase, profile: Profile| {
                sink.lock().push((case.name().to_string(), profile.wall_ns));
            }),
        )
        .include(NamePattern::substring("hot"));

        run(&middleware, "hot#a").await;
        run(&middleware, "cold#b").await;
        run(&middleware, "hot#c").await;

        assert_eq!(session.enabled.load(Ordering::SeqCst), 1);
        assert_eq!(session.started.load(Ordering::SeqCst), 2);
        assert_eq!(session.stopped.load(Ordering::SeqCst), 2);
        assert_eq!(
            *recorded.lock(),
            vec![("hot#a".to_string(), 0), ("hot#c".to_string(), 1)]
        );
    }

    #[tokio::test]
    async fn session_is_not_created_until_needed() {
        let created = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&created);
        let middleware = ProfileMiddleware::new(
            move || {
                counter.fetch_add(1, Ordering::SeqCst);
                Arc::new(WallClockSession::new()) as Arc<dyn ProfileSession>
            },
            Arc::new(|_: &BenchCase, _: Profile| {}),
        )
        .include(NamePattern::substring("never"));

        run(&middleware, "something#else").await;
        assert_eq!(created.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn wall_clock_requires_start() {
        let session = WallClockSession::new();
        assert!(session.stop().await.is_err());

        session.start().await.unwrap();
        assert!(session.stop().await.is_ok());
    }
}

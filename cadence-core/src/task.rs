//! Async Normalization
//!
//! Benchmark and lifecycle functions come in three calling conventions:
//!
//! | Convention | Shape | Completes when |
//! |------------|-------|----------------|
//! | synchronous | `Fn() -> ()` / `Fn() -> Result<(), E>` | the call returns |
//! | future-returning | `Fn() -> impl Future<Output = ()>` (or `Result`) | the future resolves |
//! | callback | `Fn(Done)` | [`Done`] is signalled |
//!
//! [`BenchFn`] erases the difference behind [`BenchFn::run`]. The convention is
//! picked from the function's static signature through [`IntoBenchFn`]; nothing
//! is ever invoked to find out what a function returns.

use crate::error::{BenchError, BoxError};
use futures::channel::oneshot;
use futures::future::{self, BoxFuture, FutureExt};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::future::Future;
use std::hint::black_box;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;

/// Calling convention of a [`BenchFn`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FnKind {
    /// Returns when done
    Sync,
    /// Returns a future
    Future,
    /// Receives a [`Done`] handle
    Callback,
}

/// Value a benchmark function may produce on completion
pub trait Outcome {
    /// Normalize into the engine's completion result
    fn into_result(self) -> Result<(), BenchError>;
}

impl Outcome for () {
    fn into_result(self) -> Result<(), BenchError> {
        Ok(())
    }
}

impl<E> Outcome for Result<(), E>
where
    E: Into<BoxError>,
{
    fn into_result(self) -> Result<(), BenchError> {
        self.map_err(|e| BenchError::from_user(e.into()))
    }
}

/// Completion handle passed to callback-style functions.
///
/// Exactly one of [`ok`](Done::ok), [`fail`](Done::fail) or
/// [`complete`](Done::complete) should be called. Dropping the handle without
/// signalling fails the invocation with [`BenchError::Abandoned`].
pub struct Done {
    tx: oneshot::Sender<Result<(), BenchError>>,
}

impl Done {
    /// Signal success
    pub fn ok(self) {
        let _ = self.tx.send(Ok(()));
    }

    /// Signal failure
    pub fn fail(self, err: impl Into<BoxError>) {
        let _ = self.tx.send(Err(BenchError::from_user(err.into())));
    }

    /// Signal with an error-first style outcome (`Ok(())` or `Err(e)`)
    pub fn complete(self, outcome: impl Outcome) {
        let _ = self.tx.send(outcome.into_result());
    }
}

impl fmt::Debug for Done {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Done").finish_non_exhaustive()
    }
}

type SyncFn = dyn Fn() -> Result<(), BenchError> + Send + Sync;
type FutureFn = dyn Fn() -> BoxFuture<'static, Result<(), BenchError>> + Send + Sync;
type CallbackFn = dyn Fn(Done) + Send + Sync;

#[derive(Clone)]
enum Inner {
    Sync(Arc<SyncFn>),
    Future(Arc<FutureFn>),
    Callback(Arc<CallbackFn>),
}

/// A benchmark or lifecycle function, classified once at construction.
///
/// Cloning is cheap; clones share the underlying function.
#[derive(Clone)]
pub struct BenchFn {
    inner: Inner,
}

impl BenchFn {
    /// Wrap a synchronous function
    pub fn sync<F, O>(f: F) -> Self
    where
        F: Fn() -> O + Send + Sync + 'static,
        O: Outcome,
    {
        Self {
            inner: Inner::Sync(Arc::new(move || f().into_result())),
        }
    }

    /// Wrap a function returning a future
    pub fn future<F, Fut>(f: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future + Send + 'static,
        Fut::Output: Outcome,
    {
        Self {
            inner: Inner::Future(Arc::new(move || {
                f().map(|outcome| outcome.into_result()).boxed()
            })),
        }
    }

    /// Wrap a callback-style function
    pub fn callback<F>(f: F) -> Self
    where
        F: Fn(Done) + Send + Sync + 'static,
    {
        Self {
            inner: Inner::Callback(Arc::new(f)),
        }
    }

    /// A function that succeeds immediately
    pub fn noop() -> Self {
        Self::sync(|| ())
    }

    /// Calling convention chosen at construction
    pub fn kind(&self) -> FnKind {
        match self.inner {
            Inner::Sync(_) => FnKind::Sync,
            Inner::Future(_) => FnKind::Future,
            Inner::Callback(_) => FnKind::Callback,
        }
    }

    /// Whether completion is signalled asynchronously
    pub fn is_deferred(&self) -> bool {
        !matches!(self.inner, Inner::Sync(_))
    }

    /// Run once to completion.
    ///
    /// Nothing executes until the returned future is polled. Errors, panics and
    /// abandoned callbacks all resolve to `Err`.
    pub fn run(&self) -> BoxFuture<'static, Result<(), BenchError>> {
        match &self.inner {
            Inner::Sync(f) => {
                let f = Arc::clone(f);
                future::lazy(move |_| call_sync(f.as_ref())).boxed()
            }
            Inner::Future(f) => {
                let f = Arc::clone(f);
                async move {
                    let fut = catch_unwind(AssertUnwindSafe(|| f())).map_err(BenchError::from_panic)?;
                    AssertUnwindSafe(fut)
                        .catch_unwind()
                        .await
                        .unwrap_or_else(|panic| Err(BenchError::from_panic(panic)))
                }
                .boxed()
            }
            Inner::Callback(f) => {
                let f = Arc::clone(f);
                async move {
                    let (tx, rx) = oneshot::channel();
                    catch_unwind(AssertUnwindSafe(|| f(Done { tx })))
                        .map_err(BenchError::from_panic)?;
                    rx.await.unwrap_or(Err(BenchError::Abandoned))
                }
                .boxed()
            }
        }
    }

    /// Run `count` times back to back, stopping at the first failure.
    ///
    /// Synchronous functions run in a tight loop without per-call future
    /// overhead, which is what the sampler times.
    pub fn run_many(&self, count: u64) -> BoxFuture<'static, Result<(), BenchError>> {
        match &self.inner {
            Inner::Sync(f) => {
                let f = Arc::clone(f);
                future::lazy(move |_| {
                    catch_unwind(AssertUnwindSafe(|| {
                        for _ in 0..count {
                            black_box(f())?;
                        }
                        Ok(())
                    }))
                    .unwrap_or_else(|panic| Err(BenchError::from_panic(panic)))
                })
                .boxed()
            }
            _ => {
                let this = self.clone();
                async move {
                    for _ in 0..count {
                        this.run().await?;
                    }
                    Ok(())
                }
                .boxed()
            }
        }
    }

    /// Compose sequentially: `first` to completion, then `second`.
    ///
    /// The result is deferred; a failure in `first` skips `second`.
    pub fn then(first: &BenchFn, second: &BenchFn) -> BenchFn {
        let (first, second) = (first.clone(), second.clone());
        BenchFn::future(move || {
            let (first, second) = (first.run(), second.run());
            async move {
                first.await?;
                second.await
            }
        })
    }
}

fn call_sync(f: &SyncFn) -> Result<(), BenchError> {
    catch_unwind(AssertUnwindSafe(f)).unwrap_or_else(|panic| Err(BenchError::from_panic(panic)))
}

impl fmt::Debug for BenchFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BenchFn").field("kind", &self.kind()).finish()
    }
}

#[doc(hidden)]
pub struct IsSync;
#[doc(hidden)]
pub struct IsFuture;
#[doc(hidden)]
pub struct IsCallback;
#[doc(hidden)]
pub struct IsBenchFn;

/// Conversion of closures into [`BenchFn`], classified by signature.
///
/// `Marker` only disambiguates the blanket impls and is always inferred.
/// Callback closures need their argument annotated: `|done: Done| done.ok()`.
pub trait IntoBenchFn<Marker> {
    /// Perform the conversion
    fn into_bench_fn(self) -> BenchFn;
}

impl IntoBenchFn<IsBenchFn> for BenchFn {
    fn into_bench_fn(self) -> BenchFn {
        self
    }
}

impl<F, O> IntoBenchFn<(IsSync, O)> for F
where
    F: Fn() -> O + Send + Sync + 'static,
    O: Outcome,
{
    fn into_bench_fn(self) -> BenchFn {
        BenchFn::sync(self)
    }
}

impl<F, Fut> IntoBenchFn<(IsFuture, Fut)> for F
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future + Send + 'static,
    Fut::Output: Outcome,
{
    fn into_bench_fn(self) -> BenchFn {
        BenchFn::future(self)
    }
}

impl<F> IntoBenchFn<IsCallback> for F
where
    F: Fn(Done) + Send + Sync + 'static,
{
    fn into_bench_fn(self) -> BenchFn {
        BenchFn::callback(self)
    }
}

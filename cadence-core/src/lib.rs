#![warn(missing_docs)]
//! Cadence Core - Execution Engine
//!
//! This crate turns registered benchmark cases into measurements:
//! - [`BenchFn`]: sync, future-returning and callback-style functions behind
//!   one completion protocol
//! - [`Options`]: immutable per-case configuration with chained lifecycle hooks
//! - [`Suite`]: nested registration scopes with `#`-joined names
//! - [`Middleware`] and [`benchmark`]: the per-case interceptor chain and the
//!   sequential run loop
//! - [`Sampler`]: the default cycle-based measurement engine
//!
//! # Example
//!
//! ```ignore
//! use cadence_core::{BenchmarkOptions, Setting, benchmark};
//! use std::time::Duration;
//!
//! let options = BenchmarkOptions::new(reporter, |api| {
//!     api.set(Setting::MaxTime(Duration::from_millis(500)));
//!     api.suite("vec", |api| {
//!         api.bench("push", || {
//!             let mut v = Vec::new();
//!             v.push(1);
//!         });
//!     });
//! });
//! let summary = benchmark(options).await?;
//! ```

mod bencher;
mod case;
mod error;
mod measure;
pub mod middleware;
mod options;
mod outcome;
mod pipeline;
mod reporter;
mod runner;
mod suite;
mod task;

pub use bencher::{
    DEFAULT_DELAY, DEFAULT_INIT_COUNT, DEFAULT_MAX_TIME, DEFAULT_MIN_SAMPLES, DEFAULT_MIN_TIME,
    Sampler,
};
pub use case::BenchCase;
pub use error::{BenchError, BoxError, OptionsError, PatternError, RunError};
/// Whether this target provides a hardware cycle counter (x86_64 RDTSCP or
/// AArch64 CNTVCT_EL0). When `false`, cycle counts are reported as 0.
pub use measure::HAS_CYCLE_COUNTER;
pub use measure::Timer;
pub use middleware::{
    GrepMiddleware, NamePattern, Profile, ProfileMiddleware, ProfileSession, ProfileSink,
    ReporterMiddleware, WallClockSession,
};
pub use options::{EventKey, Hook, OptionKey, Options, Setting, parse_duration};
pub use outcome::{CaseOutcome, CaseReport, RunSummary, Stats, Times};
pub use pipeline::{Middleware, MiddlewareStack, Next, RunFunction};
pub use reporter::Reporter;
pub use runner::{BenchmarkOptions, benchmark};
pub use suite::{SEPARATOR, Suite};
pub use task::{BenchFn, Done, FnKind, IntoBenchFn, Outcome};

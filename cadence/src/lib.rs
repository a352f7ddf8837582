#![warn(missing_docs)]
//! # Cadence
//!
//! Benchmark suites for Rust: nested scopes, lifecycle hooks and a
//! middleware pipeline around every case.
//!
//! - **Any calling convention**: plain closures, closures returning futures,
//!   and callback-style closures completing a [`Done`] handle are measured
//!   alike
//! - **Nested suites**: names join with `#`, options and setup/teardown are
//!   inherited and chained from outer to inner scopes
//! - **Middleware**: filter, profile or wrap each case; reporters hook in
//!   the same way
//! - **Pluggable engine**: the default [`Sampler`] can be replaced by any
//!   [`RunFunction`]
//!
//! ## Quick Start
//!
//! ```ignore
//! use cadence::prelude::*;
//! use std::time::Duration;
//!
//! fn main() {
//!     let result = cadence::run(|api| {
//!         api.set(Setting::MaxTime(Duration::from_secs(1)));
//!         api.suite("vec", |api| {
//!             api.bench("push", || {
//!                 let mut v = Vec::with_capacity(16);
//!                 v.push(1u64);
//!                 std::hint::black_box(v);
//!             });
//!         });
//!     });
//!     if let Err(e) = result {
//!         eprintln!("Error: {}", e);
//!         std::process::exit(1);
//!     }
//! }
//! ```
//!
//! ## Async Benchmarks
//!
//! ```ignore
//! api.bench("sleep", || async {
//!     tokio::time::sleep(Duration::from_micros(10)).await;
//! });
//!
//! api.bench("callback", |done: Done| {
//!     std::thread::spawn(move || done.ok());
//! });
//! ```

// Re-export core types
pub use cadence_core::{
    BenchCase, BenchError, BenchFn, BenchmarkOptions, BoxError, CaseOutcome, CaseReport, Done,
    EventKey, FnKind, GrepMiddleware, Hook, IntoBenchFn, Middleware, MiddlewareStack, NamePattern,
    Next, OptionKey, Options, OptionsError, Outcome, PatternError, Profile, ProfileMiddleware,
    ProfileSession, ProfileSink, Reporter, ReporterMiddleware, RunError, RunFunction, RunSummary,
    SEPARATOR, Sampler, Setting, Stats, Suite, Times, WallClockSession, benchmark, parse_duration,
};

// Re-export reporters
pub use cadence_report::{
    CsvReporter, GatherReporter, JsonReporter, JsonSummaryReporter, PrettyReporter,
    REPORTERS, ReporterFactory, find_reporter,
};

// Re-export stats
pub use cadence_stats::{Summary, summarize};

// Re-export CLI types
pub use cadence_cli::{CadenceConfig, Cli, ProfileWriter};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::{
        BenchFn, BenchmarkOptions, Done, Options, Reporter, Setting, Suite, benchmark,
    };
}

/// Run the Cadence CLI harness.
///
/// Call this from your benchmark binary's `main()`:
/// ```ignore
/// fn main() {
///     cadence::run(|api| api.bench("noop", || ())).unwrap();
/// }
/// ```
pub use cadence_cli::run;

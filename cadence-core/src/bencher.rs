//! Sampler - The Default Measurement Engine
//!
//! Runs the installed function in timed cycles. Each cycle invokes it `count`
//! times back to back; the per-operation time of a cycle is one sample.
//!
//! 1. Calibration: cycles shorter than `min_time` are discarded and `count`
//!    is scaled up until a cycle is long enough. `on_reset` fires when the
//!    calibrated count is settled.
//! 2. Sampling: cycles continue until at least `min_samples` samples exist
//!    and `max_time` has elapsed, sleeping `delay` between cycles.
//!
//! Event hooks fire in order `on_start`, `on_cycle`*, (`on_error`),
//! `on_complete`. A failure while timing ends measurement and is recorded on
//! the report rather than returned.

use crate::error::BenchError;
use crate::measure::Timer;
use crate::options::{OptionKey, Options};
use crate::outcome::{CaseReport, Stats, Times};
use crate::pipeline::RunFunction;
use cadence_stats::{DEFAULT_FENCE, summarize};
use futures::future::{BoxFuture, FutureExt};
use std::time::Duration;

/// Default upper bound on time spent measuring one case
pub const DEFAULT_MAX_TIME: Duration = Duration::from_secs(5);

/// Default minimum number of samples
pub const DEFAULT_MIN_SAMPLES: u64 = 5;

/// Default number of iterations in the first cycle
pub const DEFAULT_INIT_COUNT: u64 = 1;

/// Default pause between cycles
pub const DEFAULT_DELAY: Duration = Duration::from_millis(5);

/// Default minimum duration of a sampled cycle
pub const DEFAULT_MIN_TIME: Duration = Duration::from_millis(50);

/// Growth factor when a calibration cycle finished too quickly to estimate from
const BLIND_GROWTH: u64 = 10;

/// Timing parameters of one measurement, resolved from options and defaults
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Plan {
    max_time: Duration,
    min_samples: usize,
    init_count: u64,
    delay: Duration,
    min_time: Duration,
}

/// Default [`RunFunction`]: cycle-based sampling with summary statistics.
///
/// Values set on the case options take precedence over the sampler's own
/// defaults.
#[derive(Debug, Clone)]
pub struct Sampler {
    defaults: Plan,
    fence: f64,
}

impl Default for Sampler {
    fn default() -> Self {
        Self {
            defaults: Plan {
                max_time: DEFAULT_MAX_TIME,
                min_samples: DEFAULT_MIN_SAMPLES as usize,
                init_count: DEFAULT_INIT_COUNT,
                delay: DEFAULT_DELAY,
                min_time: DEFAULT_MIN_TIME,
            },
            fence: DEFAULT_FENCE,
        }
    }
}

impl Sampler {
    /// Sampler with the default timing parameters
    pub fn new() -> Self {
        Self::default()
    }

    /// Tukey fence multiplier used to exclude outliers from the mean
    pub fn with_fence(mut self, fence: f64) -> Self {
        self.fence = fence;
        self
    }

    fn plan(&self, options: &Options) -> Plan {
        Plan {
            max_time: options.max_time().unwrap_or(self.defaults.max_time),
            min_samples: options
                .min_samples()
                .map_or(self.defaults.min_samples, |n| n as usize)
                .max(1),
            init_count: options.init_count().unwrap_or(self.defaults.init_count).max(1),
            delay: options.delay().unwrap_or(self.defaults.delay),
            min_time: options.min_time().unwrap_or(self.defaults.min_time),
        }
    }

    /// Measure the function installed in `options`
    pub async fn measure(&self, name: String, options: Options) -> Result<CaseReport, BenchError> {
        let func = options
            .run()
            .cloned()
            .ok_or_else(|| BenchError::Failed(format!("no function installed for `{name}`")))?;
        let plan = self.plan(&options);

        let mut report = CaseReport::named(options.name().map_or(name, str::to_string));
        tracing::debug!(case = %report.name, kind = ?func.kind(), ?plan, "Measuring");
        options.fire(OptionKey::OnStart, &report);

        let started = Timer::start();
        let mut count = plan.init_count;
        let mut calibrating = true;
        let mut samples: Vec<f64> = Vec::with_capacity(plan.min_samples);

        loop {
            let timer = Timer::start();
            let result = func.run_many(count).await;
            let (nanos, _cycles) = timer.stop();

            if let Err(err) = result {
                report.error = Some(err.to_string());
                options.fire(OptionKey::OnError, &report);
                break;
            }

            report.cycles += 1;
            report.count = count;
            options.fire(OptionKey::OnCycle, &report);

            let cycle = Duration::from_nanos(nanos);
            if calibrating {
                if cycle < plan.min_time && started.elapsed() < plan.max_time {
                    count = grow(count, cycle, plan.min_time);
                    continue;
                }
                calibrating = false;
                options.fire(OptionKey::OnReset, &report);
            }

            samples.push(cycle.as_secs_f64() / count as f64);
            if samples.len() >= plan.min_samples && started.elapsed() >= plan.max_time {
                break;
            }
            if !plan.delay.is_zero() {
                tokio::time::sleep(plan.delay).await;
            }
        }

        let summary = summarize(&samples, self.fence);
        report.hz = summary.hz();
        report.stats = Stats {
            mean: summary.mean,
            deviation: summary.deviation,
            variance: summary.variance,
            sem: summary.sem,
            moe: summary.moe,
            rme: summary.rme,
            sample: summary.sample_count,
        };
        report.times = Times {
            elapsed: started.elapsed().as_secs_f64(),
            period: summary.mean,
        };

        options.fire(OptionKey::OnComplete, &report);
        Ok(report)
    }
}

/// Next calibration count, aiming one cycle at `target`
fn grow(count: u64, cycle: Duration, target: Duration) -> u64 {
    let factor = if cycle.is_zero() {
        BLIND_GROWTH
    } else {
        (target.as_secs_f64() / cycle.as_secs_f64()).ceil() as u64
    };
    count.saturating_mul(factor.clamp(2, BLIND_GROWTH * 10))
}

impl RunFunction for Sampler {
    fn run(&self, name: String, options: Options) -> BoxFuture<'_, Result<CaseReport, BenchError>> {
        self.measure(name, options).boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::BenchFn;
    use parking_lot::Mutex;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU64, Ordering};

    fn quick() -> Options {
        Options::new()
            .with_max_time(Duration::from_millis(20))
            .with_min_time(Duration::from_millis(1))
            .with_min_samples(3)
            .with_delay(Duration::ZERO)
    }

    #[test]
    fn test_calibration_growth() {
        assert_eq!(grow(1, Duration::ZERO, Duration::from_millis(50)), 10);
        assert_eq!(grow(4, Duration::from_millis(10), Duration::from_millis(50)), 20);
        assert_eq!(grow(4, Duration::from_millis(49), Duration::from_millis(50)), 8);
        assert_eq!(grow(u64::MAX, Duration::ZERO, Duration::from_millis(50)), u64::MAX);
    }

    #[test]
    fn test_options_override_defaults() {
        let plan = Sampler::new().plan(&Options::new().with_min_samples(0).with_init_count(7));
        assert_eq!(plan.min_samples, 1);
        assert_eq!(plan.init_count, 7);
        assert_eq!(plan.max_time, DEFAULT_MAX_TIME);
        assert_eq!(plan.delay, DEFAULT_DELAY);
    }

    #[tokio::test]
    async fn test_measures_sync_function() {
        let calls = Arc::new(AtomicU64::new(0));
        let counter = Arc::clone(&calls);
        let options = quick().with_run(BenchFn::sync(move || {
            counter.fetch_add(1, Ordering::Relaxed);
        }));

        let report = Sampler::new().measure("sum".to_string(), options).await.unwrap();

        assert_eq!(report.name, "sum");
        assert!(report.error.is_none());
        assert!(report.hz > 0.0);
        assert!(report.stats.sample >= 3);
        assert!(report.cycles as usize >= report.stats.sample);
        assert!(calls.load(Ordering::Relaxed) >= report.count);
        assert!(report.times.elapsed >= 0.02);
    }

    #[tokio::test]
    async fn test_hooks_fire_in_order() {
        let events = Arc::new(Mutex::new(Vec::new()));
        let hook = |label: &'static str| {
            let events = Arc::clone(&events);
            move |_: &CaseReport| {
                let mut events = events.lock();
                if events.last() != Some(&label) {
                    events.push(label);
                }
            }
        };
        let options = quick()
            .on_start(hook("start"))
            .on_cycle(hook("cycle"))
            .on_complete(hook("complete"))
            .with_run(BenchFn::future(|| async {}));

        Sampler::new().measure("async".to_string(), options).await.unwrap();

        let events = events.lock();
        assert_eq!(events.first(), Some(&"start"));
        assert_eq!(events.last(), Some(&"complete"));
        assert!(events.contains(&"cycle"));
    }

    #[tokio::test]
    async fn test_measurement_errors_are_reported() {
        let errored = Arc::new(Mutex::new(None));
        let seen = Arc::clone(&errored);
        let options = quick()
            .on_error(move |report| *seen.lock() = report.error.clone())
            .with_run(BenchFn::sync(|| Err::<(), _>("broken")));

        let report = Sampler::new().measure("bad".to_string(), options).await.unwrap();

        assert_eq!(report.error.as_deref(), Some("broken"));
        assert_eq!(errored.lock().as_deref(), Some("broken"));
        assert_eq!(report.hz, 0.0);
    }

    #[tokio::test]
    async fn test_missing_function_fails() {
        let err = Sampler::new().measure("empty".to_string(), quick()).await.unwrap_err();
        assert!(matches!(err, BenchError::Failed(msg) if msg.contains("empty")));
    }
}

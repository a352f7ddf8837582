//! Options Model
//!
//! [`Options`] is an immutable record over a fixed key set ([`OptionKey`]).
//! Records are combined three ways:
//!
//! - [`assign`](Options::assign): right-hand values replace left-hand ones
//! - [`strip`](Options::strip): named keys are removed
//! - [`merge`](Options::merge): scalars are replaced, lifecycle functions and
//!   event hooks are chained
//!
//! Merge chains `setup` outer-first, `teardown` inner-first and event hooks
//! inner-first, so folding scopes `A -> B -> C` yields setup order `A, B, C`
//! and teardown order `C, B, A` whatever the grouping.

use crate::error::OptionsError;
use crate::outcome::CaseReport;
use crate::task::{BenchFn, IntoBenchFn};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Event callback receiving the current case report
pub type Hook = Arc<dyn Fn(&CaseReport) + Send + Sync>;

/// Recognized option keys
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum OptionKey {
    /// Whether the installed function completes asynchronously
    Defer,
    /// Pause between timed cycles
    Delay,
    /// Iterations in the first cycle
    InitCount,
    /// Upper bound on measuring time
    MaxTime,
    /// Minimum number of samples
    MinSamples,
    /// Minimum time per cycle
    MinTime,
    /// Display name
    Name,
    /// Runs before measurement
    Setup,
    /// Runs after measurement
    Teardown,
    /// Fired when measurement starts
    OnStart,
    /// Fired after every cycle
    OnCycle,
    /// Fired when measurement finishes
    OnComplete,
    /// Fired when the function fails while being timed
    OnError,
    /// Fired when calibration is discarded
    OnReset,
    /// The installed benchmark function
    Run,
}

impl OptionKey {
    /// Every key, in declaration order
    pub const ALL: [OptionKey; 15] = [
        OptionKey::Defer,
        OptionKey::Delay,
        OptionKey::InitCount,
        OptionKey::MaxTime,
        OptionKey::MinSamples,
        OptionKey::MinTime,
        OptionKey::Name,
        OptionKey::Setup,
        OptionKey::Teardown,
        OptionKey::OnStart,
        OptionKey::OnCycle,
        OptionKey::OnComplete,
        OptionKey::OnError,
        OptionKey::OnReset,
        OptionKey::Run,
    ];

    /// Keys only the harness understands, removed before measurement
    pub const INTERNAL: [OptionKey; 2] = [OptionKey::Setup, OptionKey::Teardown];

    /// Canonical snake_case name
    pub fn as_str(self) -> &'static str {
        match self {
            OptionKey::Defer => "defer",
            OptionKey::Delay => "delay",
            OptionKey::InitCount => "init_count",
            OptionKey::MaxTime => "max_time",
            OptionKey::MinSamples => "min_samples",
            OptionKey::MinTime => "min_time",
            OptionKey::Name => "name",
            OptionKey::Setup => "setup",
            OptionKey::Teardown => "teardown",
            OptionKey::OnStart => "on_start",
            OptionKey::OnCycle => "on_cycle",
            OptionKey::OnComplete => "on_complete",
            OptionKey::OnError => "on_error",
            OptionKey::OnReset => "on_reset",
            OptionKey::Run => "run",
        }
    }

    /// Look a key up by name; accepts snake_case and camelCase spellings
    pub fn parse(name: &str) -> Option<OptionKey> {
        let key = match name {
            "defer" => OptionKey::Defer,
            "delay" => OptionKey::Delay,
            "init_count" | "initCount" => OptionKey::InitCount,
            "max_time" | "maxTime" => OptionKey::MaxTime,
            "min_samples" | "minSamples" => OptionKey::MinSamples,
            "min_time" | "minTime" => OptionKey::MinTime,
            "name" => OptionKey::Name,
            "setup" => OptionKey::Setup,
            "teardown" => OptionKey::Teardown,
            "on_start" | "onStart" => OptionKey::OnStart,
            "on_cycle" | "onCycle" => OptionKey::OnCycle,
            "on_complete" | "onComplete" => OptionKey::OnComplete,
            "on_error" | "onError" => OptionKey::OnError,
            "on_reset" | "onReset" => OptionKey::OnReset,
            "fn" | "run" => OptionKey::Run,
            _ => return None,
        };
        Some(key)
    }

    /// Whether this key holds an event hook
    pub fn is_event(self) -> bool {
        matches!(
            self,
            OptionKey::OnStart
                | OptionKey::OnCycle
                | OptionKey::OnComplete
                | OptionKey::OnError
                | OptionKey::OnReset
        )
    }
}

/// The `on_*` subset of [`OptionKey`], the only keys that hold hooks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EventKey {
    /// `on_start`
    OnStart,
    /// `on_cycle`
    OnCycle,
    /// `on_complete`
    OnComplete,
    /// `on_error`
    OnError,
    /// `on_reset`
    OnReset,
}

impl EventKey {
    /// Every event key
    pub const ALL: [EventKey; 5] = [
        EventKey::OnStart,
        EventKey::OnCycle,
        EventKey::OnComplete,
        EventKey::OnError,
        EventKey::OnReset,
    ];

    /// The general key
    pub fn key(self) -> OptionKey {
        match self {
            EventKey::OnStart => OptionKey::OnStart,
            EventKey::OnCycle => OptionKey::OnCycle,
            EventKey::OnComplete => OptionKey::OnComplete,
            EventKey::OnError => OptionKey::OnError,
            EventKey::OnReset => OptionKey::OnReset,
        }
    }
}

impl From<EventKey> for OptionKey {
    fn from(event: EventKey) -> Self {
        event.key()
    }
}

impl TryFrom<OptionKey> for EventKey {
    type Error = OptionKey;

    fn try_from(key: OptionKey) -> Result<Self, OptionKey> {
        match key {
            OptionKey::OnStart => Ok(EventKey::OnStart),
            OptionKey::OnCycle => Ok(EventKey::OnCycle),
            OptionKey::OnComplete => Ok(EventKey::OnComplete),
            OptionKey::OnError => Ok(EventKey::OnError),
            OptionKey::OnReset => Ok(EventKey::OnReset),
            other => Err(other),
        }
    }
}

impl fmt::Display for OptionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Default)]
struct Events {
    on_start: Option<Hook>,
    on_cycle: Option<Hook>,
    on_complete: Option<Hook>,
    on_error: Option<Hook>,
    on_reset: Option<Hook>,
}

impl Events {
    fn slot(&self, key: OptionKey) -> Option<&Option<Hook>> {
        match key {
            OptionKey::OnStart => Some(&self.on_start),
            OptionKey::OnCycle => Some(&self.on_cycle),
            OptionKey::OnComplete => Some(&self.on_complete),
            OptionKey::OnError => Some(&self.on_error),
            OptionKey::OnReset => Some(&self.on_reset),
            _ => None,
        }
    }

    fn hook_mut(&mut self, event: EventKey) -> &mut Option<Hook> {
        match event {
            EventKey::OnStart => &mut self.on_start,
            EventKey::OnCycle => &mut self.on_cycle,
            EventKey::OnComplete => &mut self.on_complete,
            EventKey::OnError => &mut self.on_error,
            EventKey::OnReset => &mut self.on_reset,
        }
    }

    fn slot_mut(&mut self, key: OptionKey) -> Option<&mut Option<Hook>> {
        match key {
            OptionKey::OnStart => Some(&mut self.on_start),
            OptionKey::OnCycle => Some(&mut self.on_cycle),
            OptionKey::OnComplete => Some(&mut self.on_complete),
            OptionKey::OnError => Some(&mut self.on_error),
            OptionKey::OnReset => Some(&mut self.on_reset),
            _ => None,
        }
    }
}

/// Immutable, hierarchically inheritable configuration of a case.
///
/// Unset keys fall back to whatever the measurement engine uses by default.
/// Every combinator returns a new record.
#[derive(Clone, Default)]
pub struct Options {
    defer: Option<bool>,
    delay: Option<Duration>,
    init_count: Option<u64>,
    max_time: Option<Duration>,
    min_samples: Option<u64>,
    min_time: Option<Duration>,
    name: Option<String>,
    setup: Option<BenchFn>,
    teardown: Option<BenchFn>,
    events: Events,
    run: Option<BenchFn>,
}

impl Options {
    /// An empty record
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a record from an untyped table, ignoring unrecognized keys.
    ///
    /// Durations are seconds (integer or float) or strings such as `"500ms"`.
    /// Function-valued keys cannot be expressed in a table.
    pub fn from_table(table: &toml::Table) -> Result<Self, OptionsError> {
        let mut options = Options::new();
        for (name, value) in table {
            let Some(key) = OptionKey::parse(name) else {
                continue;
            };
            match key {
                OptionKey::Defer => {
                    options.defer = Some(value.as_bool().ok_or(OptionsError::InvalidValue {
                        key: key.as_str(),
                        expected: "a boolean",
                    })?);
                }
                OptionKey::Delay => options.delay = Some(duration_value(key, value)?),
                OptionKey::MaxTime => options.max_time = Some(duration_value(key, value)?),
                OptionKey::MinTime => options.min_time = Some(duration_value(key, value)?),
                OptionKey::InitCount => options.init_count = Some(count_value(key, value)?),
                OptionKey::MinSamples => options.min_samples = Some(count_value(key, value)?),
                OptionKey::Name => {
                    let name = value.as_str().ok_or(OptionsError::InvalidValue {
                        key: key.as_str(),
                        expected: "a string",
                    })?;
                    options.name = Some(name.to_string());
                }
                _ => return Err(OptionsError::NotConfigurable(key.as_str())),
            }
        }
        Ok(options)
    }

    // ─── Builders ────────────────────────────────────────────────────────────

    /// Mark the installed function as asynchronous
    pub fn with_defer(mut self, defer: bool) -> Self {
        self.defer = Some(defer);
        self
    }

    /// Pause between cycles
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Iterations in the first cycle
    pub fn with_init_count(mut self, count: u64) -> Self {
        self.init_count = Some(count);
        self
    }

    /// Upper bound on measuring time
    pub fn with_max_time(mut self, max_time: Duration) -> Self {
        self.max_time = Some(max_time);
        self
    }

    /// Minimum samples before measurement may stop
    pub fn with_min_samples(mut self, samples: u64) -> Self {
        self.min_samples = Some(samples);
        self
    }

    /// Minimum time per cycle
    pub fn with_min_time(mut self, min_time: Duration) -> Self {
        self.min_time = Some(min_time);
        self
    }

    /// Display name
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Function run before measurement
    pub fn with_setup<M>(mut self, setup: impl IntoBenchFn<M>) -> Self {
        self.setup = Some(setup.into_bench_fn());
        self
    }

    /// Function run after measurement
    pub fn with_teardown<M>(mut self, teardown: impl IntoBenchFn<M>) -> Self {
        self.teardown = Some(teardown.into_bench_fn());
        self
    }

    /// Install the function to measure; `defer` follows its calling convention
    pub fn with_run(mut self, func: BenchFn) -> Self {
        self.defer = Some(func.is_deferred());
        self.run = Some(func);
        self
    }

    /// Set an event hook
    pub fn with_hook(mut self, event: EventKey, hook: Hook) -> Self {
        *self.events.hook_mut(event) = Some(hook);
        self
    }

    /// Fired when measurement starts
    pub fn on_start(self, f: impl Fn(&CaseReport) + Send + Sync + 'static) -> Self {
        self.with_hook(EventKey::OnStart, Arc::new(f))
    }

    /// Fired after every timed cycle
    pub fn on_cycle(self, f: impl Fn(&CaseReport) + Send + Sync + 'static) -> Self {
        self.with_hook(EventKey::OnCycle, Arc::new(f))
    }

    /// Fired when measurement finishes, successfully or not
    pub fn on_complete(self, f: impl Fn(&CaseReport) + Send + Sync + 'static) -> Self {
        self.with_hook(EventKey::OnComplete, Arc::new(f))
    }

    /// Fired when the function fails while being timed
    pub fn on_error(self, f: impl Fn(&CaseReport) + Send + Sync + 'static) -> Self {
        self.with_hook(EventKey::OnError, Arc::new(f))
    }

    /// Fired when calibration cycles are discarded
    pub fn on_reset(self, f: impl Fn(&CaseReport) + Send + Sync + 'static) -> Self {
        self.with_hook(EventKey::OnReset, Arc::new(f))
    }

    // ─── Accessors ───────────────────────────────────────────────────────────

    /// `defer`, if set
    pub fn defer(&self) -> Option<bool> {
        self.defer
    }

    /// `delay`, if set
    pub fn delay(&self) -> Option<Duration> {
        self.delay
    }

    /// `init_count`, if set
    pub fn init_count(&self) -> Option<u64> {
        self.init_count
    }

    /// `max_time`, if set
    pub fn max_time(&self) -> Option<Duration> {
        self.max_time
    }

    /// `min_samples`, if set
    pub fn min_samples(&self) -> Option<u64> {
        self.min_samples
    }

    /// `min_time`, if set
    pub fn min_time(&self) -> Option<Duration> {
        self.min_time
    }

    /// `name`, if set
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// `setup`, if set
    pub fn setup(&self) -> Option<&BenchFn> {
        self.setup.as_ref()
    }

    /// `teardown`, if set
    pub fn teardown(&self) -> Option<&BenchFn> {
        self.teardown.as_ref()
    }

    /// `run`, if set
    pub fn run(&self) -> Option<&BenchFn> {
        self.run.as_ref()
    }

    /// The hook stored under an `on_*` key
    pub fn hook(&self, key: OptionKey) -> Option<&Hook> {
        self.events.slot(key).and_then(Option::as_ref)
    }

    /// Invoke the hook stored under `key`, if any
    pub fn fire(&self, key: OptionKey, report: &CaseReport) {
        if let Some(hook) = self.hook(key) {
            hook(report);
        }
    }

    /// Whether `key` holds a value
    pub fn contains(&self, key: OptionKey) -> bool {
        match key {
            OptionKey::Defer => self.defer.is_some(),
            OptionKey::Delay => self.delay.is_some(),
            OptionKey::InitCount => self.init_count.is_some(),
            OptionKey::MaxTime => self.max_time.is_some(),
            OptionKey::MinSamples => self.min_samples.is_some(),
            OptionKey::MinTime => self.min_time.is_some(),
            OptionKey::Name => self.name.is_some(),
            OptionKey::Setup => self.setup.is_some(),
            OptionKey::Teardown => self.teardown.is_some(),
            OptionKey::Run => self.run.is_some(),
            event => self.hook(event).is_some(),
        }
    }

    /// Keys holding a value, in declaration order
    pub fn keys(&self) -> Vec<OptionKey> {
        OptionKey::ALL
            .into_iter()
            .filter(|key| self.contains(*key))
            .collect()
    }

    /// Whether no key holds a value
    pub fn is_empty(&self) -> bool {
        self.keys().is_empty()
    }

    // ─── Combinators ─────────────────────────────────────────────────────────

    /// Overwrite with every value `overrides` defines
    pub fn assign(&self, overrides: &Options) -> Options {
        let mut events = self.events.clone();
        for key in OptionKey::ALL.into_iter().filter(|k| k.is_event()) {
            if let (Some(hook), Some(slot)) = (overrides.hook(key), events.slot_mut(key)) {
                *slot = Some(Arc::clone(hook));
            }
        }

        Options {
            defer: overrides.defer.or(self.defer),
            delay: overrides.delay.or(self.delay),
            init_count: overrides.init_count.or(self.init_count),
            max_time: overrides.max_time.or(self.max_time),
            min_samples: overrides.min_samples.or(self.min_samples),
            min_time: overrides.min_time.or(self.min_time),
            name: overrides.name.clone().or_else(|| self.name.clone()),
            setup: overrides.setup.clone().or_else(|| self.setup.clone()),
            teardown: overrides.teardown.clone().or_else(|| self.teardown.clone()),
            events,
            run: overrides.run.clone().or_else(|| self.run.clone()),
        }
    }

    /// Copy without the given keys
    pub fn strip(&self, keys: &[OptionKey]) -> Options {
        let mut stripped = self.clone();
        for key in keys {
            match key {
                OptionKey::Defer => stripped.defer = None,
                OptionKey::Delay => stripped.delay = None,
                OptionKey::InitCount => stripped.init_count = None,
                OptionKey::MaxTime => stripped.max_time = None,
                OptionKey::MinSamples => stripped.min_samples = None,
                OptionKey::MinTime => stripped.min_time = None,
                OptionKey::Name => stripped.name = None,
                OptionKey::Setup => stripped.setup = None,
                OptionKey::Teardown => stripped.teardown = None,
                OptionKey::Run => stripped.run = None,
                event => {
                    if let Some(slot) = stripped.events.slot_mut(*event) {
                        *slot = None;
                    }
                }
            }
        }
        stripped
    }

    /// Combine with an inner scope's options, chaining lifecycle functions.
    ///
    /// `self` is the outer record, `inner` the more specific one.
    pub fn merge(&self, inner: &Options) -> Options {
        let mut merged = self.assign(inner);

        merged.setup = match (&self.setup, &inner.setup) {
            (Some(outer), Some(inner)) => Some(BenchFn::then(outer, inner)),
            (outer, inner) => inner.clone().or_else(|| outer.clone()),
        };
        merged.teardown = match (&self.teardown, &inner.teardown) {
            (Some(outer), Some(inner)) => Some(BenchFn::then(inner, outer)),
            (outer, inner) => inner.clone().or_else(|| outer.clone()),
        };

        for key in OptionKey::ALL.into_iter().filter(|k| k.is_event()) {
            if let (Some(outer), Some(inner)) = (self.hook(key), inner.hook(key)) {
                let (outer, inner) = (Arc::clone(outer), Arc::clone(inner));
                let chained: Hook = Arc::new(move |report: &CaseReport| {
                    inner(report);
                    outer(report);
                });
                if let Some(slot) = merged.events.slot_mut(key) {
                    *slot = Some(chained);
                }
            }
        }

        merged
    }
}

impl fmt::Debug for Options {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s = f.debug_struct("Options");
        if let Some(defer) = self.defer {
            s.field("defer", &defer);
        }
        if let Some(delay) = self.delay {
            s.field("delay", &delay);
        }
        if let Some(count) = self.init_count {
            s.field("init_count", &count);
        }
        if let Some(max_time) = self.max_time {
            s.field("max_time", &max_time);
        }
        if let Some(samples) = self.min_samples {
            s.field("min_samples", &samples);
        }
        if let Some(min_time) = self.min_time {
            s.field("min_time", &min_time);
        }
        if let Some(name) = &self.name {
            s.field("name", name);
        }
        let functions: Vec<&str> = self
            .keys()
            .into_iter()
            .filter(|k| matches!(k, OptionKey::Setup | OptionKey::Teardown | OptionKey::Run) || k.is_event())
            .map(OptionKey::as_str)
            .collect();
        if !functions.is_empty() {
            s.field("functions", &functions);
        }
        s.finish()
    }
}

/// A single key/value override, applied to the current scope by
/// [`Suite::set`](crate::Suite::set)
#[derive(Clone)]
pub enum Setting {
    /// `defer`
    Defer(bool),
    /// `delay`
    Delay(Duration),
    /// `init_count`
    InitCount(u64),
    /// `max_time`
    MaxTime(Duration),
    /// `min_samples`
    MinSamples(u64),
    /// `min_time`
    MinTime(Duration),
    /// `name`
    Name(String),
    /// `setup`
    Setup(BenchFn),
    /// `teardown`
    Teardown(BenchFn),
    /// An event hook
    Event(EventKey, Hook),
}

impl Setting {
    /// A `setup` override
    pub fn setup<M>(f: impl IntoBenchFn<M>) -> Self {
        Setting::Setup(f.into_bench_fn())
    }

    /// A `teardown` override
    pub fn teardown<M>(f: impl IntoBenchFn<M>) -> Self {
        Setting::Teardown(f.into_bench_fn())
    }

    /// An event hook override
    pub fn event(event: EventKey, f: impl Fn(&CaseReport) + Send + Sync + 'static) -> Self {
        Setting::Event(event, Arc::new(f))
    }

    /// The key this setting targets
    pub fn key(&self) -> OptionKey {
        match self {
            Setting::Defer(_) => OptionKey::Defer,
            Setting::Delay(_) => OptionKey::Delay,
            Setting::InitCount(_) => OptionKey::InitCount,
            Setting::MaxTime(_) => OptionKey::MaxTime,
            Setting::MinSamples(_) => OptionKey::MinSamples,
            Setting::MinTime(_) => OptionKey::MinTime,
            Setting::Name(_) => OptionKey::Name,
            Setting::Setup(_) => OptionKey::Setup,
            Setting::Teardown(_) => OptionKey::Teardown,
            Setting::Event(event, _) => event.key(),
        }
    }
}

impl fmt::Debug for Setting {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Setting").field(&self.key()).finish()
    }
}

impl From<Setting> for Options {
    fn from(setting: Setting) -> Self {
        let options = Options::new();
        match setting {
            Setting::Defer(v) => options.with_defer(v),
            Setting::Delay(v) => options.with_delay(v),
            Setting::InitCount(v) => options.with_init_count(v),
            Setting::MaxTime(v) => options.with_max_time(v),
            Setting::MinSamples(v) => options.with_min_samples(v),
            Setting::MinTime(v) => options.with_min_time(v),
            Setting::Name(v) => options.with_name(v),
            Setting::Setup(f) => options.with_setup(f),
            Setting::Teardown(f) => options.with_teardown(f),
            Setting::Event(event, hook) => options.with_hook(event, hook),
        }
    }
}

/// Parse a duration such as `"3s"`, `"500ms"`, `"1.5m"` or a bare number of seconds
pub fn parse_duration(s: &str) -> Result<Duration, OptionsError> {
    let s = s.trim();
    if s.is_empty() {
        return Err(OptionsError::InvalidDuration(s.to_string()));
    }

    let (num_part, unit_part) = s
        .char_indices()
        .find(|(_, c)| c.is_alphabetic() || *c == 'µ')
        .map(|(i, _)| s.split_at(i))
        .unwrap_or((s, "s"));

    let value: f64 = num_part
        .trim()
        .parse()
        .map_err(|_| OptionsError::InvalidDuration(s.to_string()))?;

    let multiplier: f64 = match unit_part.to_lowercase().as_str() {
        "ns" => 1.0,
        "us" | "µs" => 1_000.0,
        "ms" => 1_000_000.0,
        "s" => 1_000_000_000.0,
        "m" | "min" => 60_000_000_000.0,
        _ => return Err(OptionsError::InvalidDuration(s.to_string())),
    };

    let nanos = value * multiplier;
    if !nanos.is_finite() || nanos < 0.0 {
        return Err(OptionsError::InvalidDuration(s.to_string()));
    }
    Ok(Duration::from_nanos(nanos.round() as u64))
}

fn duration_value(key: OptionKey, value: &toml::Value) -> Result<Duration, OptionsError> {
    let invalid = || OptionsError::InvalidValue {
        key: key.as_str(),
        expected: "seconds or a duration string",
    };
    match value {
        toml::Value::String(s) => parse_duration(s),
        toml::Value::Integer(n) => u64::try_from(*n).map(Duration::from_secs).map_err(|_| invalid()),
        toml::Value::Float(f) => Duration::try_from_secs_f64(*f).map_err(|_| invalid()),
        _ => Err(invalid()),
    }
}

fn count_value(key: OptionKey, value: &toml::Value) -> Result<u64, OptionsError> {
    value
        .as_integer()
        .and_then(|n| u64::try_from(n).ok())
        .ok_or(OptionsError::InvalidValue {
            key: key.as_str(),
            expected: "a non-negative integer",
        })
}

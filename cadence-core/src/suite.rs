//! Scope/Suite Builder
//!
//! Registration code declares cases through a [`Suite`] handle. Nested
//! [`suite`](Suite::suite) calls push a scope that prefixes names with
//! `<suite>#` and merges its options over the parent's; the scope is popped
//! when the body returns, or unwinds.

use crate::case::BenchCase;
use crate::middleware::NamePattern;
use crate::options::{Options, Setting};
use crate::pipeline::MiddlewareStack;
use crate::task::IntoBenchFn;
use parking_lot::Mutex;
use std::hint::black_box;
use std::sync::Arc;

/// Separator between suite names in a case name
pub const SEPARATOR: char = '#';

#[derive(Clone)]
struct Scope {
    prefix: String,
    options: Options,
    middleware: MiddlewareStack,
}

struct State {
    scopes: Vec<Scope>,
    cases: Vec<BenchCase>,
}

impl State {
    fn current(&self) -> &Scope {
        // The root scope is never popped.
        &self.scopes[self.scopes.len() - 1]
    }
}

/// Registration API handed to the prepare callback.
///
/// Cloning yields another handle to the same registry, so nested closures
/// may capture it freely.
#[derive(Clone)]
pub struct Suite {
    state: Arc<Mutex<State>>,
    filter: Option<Arc<NamePattern>>,
}

impl Default for Suite {
    fn default() -> Self {
        Self::new()
    }
}

impl Suite {
    /// Empty registry with no middleware, options or filter
    pub fn new() -> Self {
        Self::with_root(Arc::from(Vec::new()), Options::new(), None)
    }

    pub(crate) fn with_root(
        middleware: MiddlewareStack,
        options: Options,
        filter: Option<NamePattern>,
    ) -> Self {
        let root = Scope {
            prefix: String::new(),
            options,
            middleware,
        };
        Self {
            state: Arc::new(Mutex::new(State {
                scopes: vec![root],
                cases: Vec::new(),
            })),
            filter: filter.map(Arc::new),
        }
    }

    /// Register a case in the current scope
    pub fn bench<M>(&self, name: &str, func: impl IntoBenchFn<M>) {
        self.bench_with(name, func, Options::new());
    }

    /// Register a case with its own option overrides
    pub fn bench_with<M>(&self, name: &str, func: impl IntoBenchFn<M>, options: Options) {
        let mut state = self.state.lock();
        let scope = state.current();
        let full_name = format!("{}{}", scope.prefix, name);

        if let Some(filter) = &self.filter {
            if !filter.matches(&full_name) {
                tracing::trace!(case = %full_name, "Not registered: excluded by filter");
                return;
            }
        }

        let case = BenchCase::new(
            full_name,
            func.into_bench_fn(),
            Arc::clone(&scope.middleware),
            scope.options.merge(&options),
        );
        state.cases.push(case);
    }

    /// Declare a nested suite; `body` runs immediately inside the new scope
    pub fn suite(&self, name: &str, body: impl FnOnce(&Suite)) {
        self.suite_with(name, Options::new(), body);
    }

    /// Declare a nested suite with option overrides for everything inside it
    pub fn suite_with(&self, name: &str, options: Options, body: impl FnOnce(&Suite)) {
        {
            let mut state = self.state.lock();
            let parent = state.current();
            let child = Scope {
                prefix: format!("{}{}{}", parent.prefix, name, SEPARATOR),
                options: parent.options.merge(&options),
                middleware: Arc::clone(&parent.middleware),
            };
            state.scopes.push(child);
        }

        let _guard = ScopeGuard { suite: self };
        body(self);
    }

    /// Override one option for cases declared later in the current scope
    /// and its descendants
    pub fn set(&self, setting: Setting) {
        let overrides = Options::from(setting);
        let mut state = self.state.lock();
        let last = state.scopes.len() - 1;
        let merged = state.scopes[last].options.merge(&overrides);
        state.scopes[last].options = merged;
    }

    /// Keep `value` alive as far as the optimizer can tell
    pub fn retain<T>(&self, value: T) {
        black_box(value);
    }

    /// Name prefix of the current scope
    pub fn prefix(&self) -> String {
        self.state.lock().current().prefix.clone()
    }

    /// Number of cases registered so far
    pub fn len(&self) -> usize {
        self.state.lock().cases.len()
    }

    /// Whether no case has been registered
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Take the registered cases, in declaration order
    pub fn into_cases(self) -> Vec<BenchCase> {
        std::mem::take(&mut self.state.lock().cases)
    }
}

struct ScopeGuard<'a> {
    suite: &'a Suite,
}

impl Drop for ScopeGuard<'_> {
    fn drop(&mut self) {
        let mut state = self.suite.state.lock();
        if state.scopes.len() > 1 {
            state.scopes.pop();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::OptionKey;
    use std::panic::{AssertUnwindSafe, catch_unwind};
    use std::time::Duration;

    fn names(cases: &[BenchCase]) -> Vec<&str> {
        cases.iter().map(BenchCase::name).collect()
    }

    #[test]
    fn nested_suites_prefix_names() {
        let suite = Suite::new();
        suite.bench("top", || ());
        suite.suite("a", |s| {
            s.suite("b", |s| {
                s.bench("c", || ());
            });
            s.bench("d", || ());
        });
        suite.bench("after", || ());

        let cases = suite.into_cases();
        assert_eq!(names(&cases), vec!["top", "a#b#c", "a#d", "after"]);
    }

    #[test]
    fn set_only_affects_later_declarations() {
        let suite = Suite::new();
        suite.bench("before", || ());
        suite.set(Setting::MaxTime(Duration::from_secs(1)));
        suite.bench("after", || ());
        suite.suite("inner", |s| {
            s.set(Setting::InitCount(100));
            s.bench("c", || ());
        });
        suite.bench("outside", || ());

        let cases = suite.into_cases();
        let max_times: Vec<_> = cases.iter().map(|c| c.options().max_time()).collect();
        let init_counts: Vec<_> = cases.iter().map(|c| c.options().init_count()).collect();

        assert_eq!(
            max_times,
            vec![None, Some(Duration::from_secs(1)), Some(Duration::from_secs(1)), Some(Duration::from_secs(1))]
        );
        assert_eq!(init_counts, vec![None, None, Some(100), None]);
    }

    #[test]
    fn case_options_merge_over_scope_options() {
        let suite = Suite::new();
        suite.suite_with("s", Options::new().with_min_samples(10).with_init_count(2), |s| {
            s.bench_with("x", || (), Options::new().with_min_samples(3));
        });

        let cases = suite.into_cases();
        assert_eq!(cases[0].options().min_samples(), Some(3));
        assert_eq!(cases[0].options().init_count(), Some(2));
    }

    #[test]
    fn filter_drops_cases_at_registration() {
        let filter = NamePattern::regex("^a").unwrap();
        let suite = Suite::with_root(Arc::from(Vec::new()), Options::new(), Some(filter));
        suite.bench("a", || ());
        suite.bench("b", || ());
        suite.suite("alpha", |s| s.bench("x", || ()));
        suite.suite("beta", |s| s.bench("a", || ()));

        assert_eq!(names(&suite.into_cases()), vec!["a", "alpha#x"]);
    }

    #[test]
    fn scope_is_popped_when_body_panics() {
        let suite = Suite::new();
        let result = catch_unwind(AssertUnwindSafe(|| {
            suite.suite("broken", |_| panic!("registration failed"));
        }));

        assert!(result.is_err());
        assert_eq!(suite.prefix(), "");
        suite.bench("later", || ());
        assert_eq!(names(&suite.into_cases()), vec!["later"]);
    }

    #[test]
    fn cloned_handles_share_the_registry() {
        let suite = Suite::new();
        let captured = suite.clone();
        suite.suite("outer", move |_| captured.bench("via clone", || ()));

        assert_eq!(suite.len(), 1);
        assert_eq!(names(&suite.into_cases()), vec!["outer#via clone"]);
    }

    #[test]
    fn retain_accepts_anything() {
        let suite = Suite::new();
        suite.retain(vec![1, 2, 3]);
        suite.retain("text");
        suite.retain(());
        assert!(suite.is_empty());
    }

    #[test]
    fn middleware_is_shared_not_copied() {
        let suite = Suite::new();
        suite.bench("a", || ());
        suite.suite("s", |s| s.bench("b", || ()));

        let cases = suite.into_cases();
        assert!(Arc::ptr_eq(cases[0].middleware(), cases[1].middleware()));
        assert!(!cases[0].options().contains(OptionKey::Run));
    }
}

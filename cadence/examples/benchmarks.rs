//! Cadence Example Benchmarks
//!
//! This example demonstrates Cadence features and serves as a template for
//! creating your own benchmark suite.
//!
//! Run with:
//!   cargo run --example benchmarks                          # Run all benchmarks
//!   cargo run --example benchmarks -- --help                # Show all options
//!   cargo run --example benchmarks -- -g sort               # Run only matching cases
//!   cargo run --example benchmarks -- -R json-summary       # Pick another reporter
//!   cargo run --example benchmarks -- --profile iteration   # Write profiles

use cadence::prelude::*;
use std::hint::black_box;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

fn main() {
    if let Err(e) = cadence::run(register) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn register(api: &Suite) {
    api.set(Setting::MaxTime(Duration::from_secs(1)));

    // ========================================================================
    // Iteration styles
    // ========================================================================

    api.suite("iteration", |api| {
        let data: Arc<Vec<u64>> = Arc::new((1..=10).collect());
        let acc = Arc::new(AtomicU64::new(0));

        let (d, a) = (Arc::clone(&data), Arc::clone(&acc));
        api.bench("for_each", move || {
            d.iter().for_each(|v| {
                a.fetch_xor(*v, Ordering::Relaxed);
            });
        });

        let (d, a) = (Arc::clone(&data), Arc::clone(&acc));
        api.bench("for loop", move || {
            for v in d.iter() {
                a.fetch_xor(*v, Ordering::Relaxed);
            }
        });

        let d = Arc::clone(&data);
        api.bench("fold", move || {
            black_box(d.iter().fold(0, |sum, v| sum ^ v));
        });

        api.retain(acc);
    });

    // ========================================================================
    // Lifecycle hooks
    // ========================================================================

    let scratch: Arc<input::Slot> = Arc::default();
    let (fill, clear, read) = (Arc::clone(&scratch), Arc::clone(&scratch), scratch);
    api.suite_with(
        "sorting",
        Options::new()
            .with_setup(move || fill.fill(10_000))
            .with_teardown(move || clear.clear()),
        |api| {
            api.bench("sort_unstable", move || {
                let mut v = read.snapshot();
                v.sort_unstable();
                black_box(v);
            });
        },
    );

    // ========================================================================
    // Asynchronous cases
    // ========================================================================

    api.suite("async", |api| {
        api.set(Setting::MaxTime(Duration::from_millis(500)));

        api.bench("yield", || async {
            tokio::task::yield_now().await;
        });

        api.bench("spawn_blocking", || async {
            tokio::task::spawn_blocking(|| black_box(7u64 * 6))
                .await
                .map(drop)
        });

        api.bench("thread callback", |done: Done| {
            std::thread::spawn(move || done.ok());
        });
    });
}

/// Shared input for the sorting suite, refilled by setup
mod input {
    use parking_lot::Mutex;

    #[derive(Default)]
    pub struct Slot(Mutex<Vec<u64>>);

    impl Slot {
        pub fn fill(&self, len: u64) {
            let mut seed = 0x2545_f491_4f6c_dd1d_u64;
            let values = (0..len)
                .map(|_| {
                    seed ^= seed << 13;
                    seed ^= seed >> 7;
                    seed ^= seed << 17;
                    seed
                })
                .collect();
            *self.0.lock() = values;
        }

        pub fn clear(&self) {
            self.0.lock().clear();
        }

        pub fn snapshot(&self) -> Vec<u64> {
            self.0.lock().clone()
        }
    }
}

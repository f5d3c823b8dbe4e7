//! Fixed window strategy: quota counted against clock-aligned buckets.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::RwLock;
use tracing::{debug, trace};

use crate::clock::{Clock, SystemClock};

use super::{window_start, Decision, Sweeper, WindowStrategy};

/// Per-identifier state: the admission count inside one clock-aligned window.
#[derive(Debug, Clone, Copy)]
struct WindowRecord {
    count: u32,
    window_start: Duration,
}

/// Counts admissions against fixed, clock-aligned windows.
///
/// A client can send up to `limit` requests just before a window boundary and
/// another `limit` just after it. That burst is an accepted property of fixed
/// windows; use [`SlidingWindowLog`](super::SlidingWindowLog) when exact
/// trailing-window semantics matter.
pub struct FixedWindow {
    limit: u32,
    window: Duration,
    clock: Arc<dyn Clock>,
    storage: Arc<RwLock<HashMap<String, WindowRecord>>>,
    sweeper: Sweeper,
}

impl FixedWindow {
    /// Create a strategy using the system clock and the default sweep
    /// interval of twice the window size.
    ///
    /// Must be called within a Tokio runtime: the background sweeper is
    /// spawned here.
    ///
    /// # Panics
    ///
    /// Panics if `limit` or `window` is zero.
    pub fn new(limit: u32, window: Duration) -> Self {
        Self::with_clock(limit, window, Arc::new(SystemClock))
    }

    /// Create a strategy with an injected clock and the default sweep
    /// interval.
    ///
    /// Must be called within a Tokio runtime.
    ///
    /// # Panics
    ///
    /// Panics if `limit` or `window` is zero.
    pub fn with_clock(limit: u32, window: Duration, clock: Arc<dyn Clock>) -> Self {
        Self::with_sweep_interval(limit, window, window * 2, clock)
    }

    /// Create a strategy with full control over the sweep interval.
    ///
    /// Must be called within a Tokio runtime.
    ///
    /// # Panics
    ///
    /// Panics if `limit`, `window`, or `sweep_interval` is zero.
    pub fn with_sweep_interval(
        limit: u32,
        window: Duration,
        sweep_interval: Duration,
        clock: Arc<dyn Clock>,
    ) -> Self {
        assert!(limit > 0, "limit must be positive");
        assert!(!window.is_zero(), "window must be positive");
        assert!(!sweep_interval.is_zero(), "sweep interval must be positive");

        let storage = Arc::new(RwLock::new(HashMap::new()));
        let sweeper = {
            let storage = Arc::clone(&storage);
            let clock = Arc::clone(&clock);
            Sweeper::spawn(sweep_interval, move || {
                sweep(&storage, clock.now(), window)
            })
        };

        Self {
            limit,
            window,
            clock,
            storage,
            sweeper,
        }
    }
}

/// Remove every record whose window is no longer the current one.
fn sweep(storage: &RwLock<HashMap<String, WindowRecord>>, now: Duration, window: Duration) {
    let current = window_start(now, window);
    let mut storage = storage.write();
    let before = storage.len();
    storage.retain(|_, record| record.window_start == current);
    let removed = before - storage.len();
    if removed > 0 {
        debug!(removed, "swept expired fixed-window records");
    }
}

#[async_trait]
impl WindowStrategy for FixedWindow {
    fn is_request_allowed(&self, identifier: &str) -> Decision {
        let now = self.clock.now();
        let current = window_start(now, self.window);

        let mut storage = self.storage.write();
        match storage.get_mut(identifier) {
            Some(record) if record.window_start == current => {
                if record.count < self.limit {
                    record.count += 1;
                    trace!(identifier, count = record.count, "admitted");
                    Decision::admitted(self.limit - record.count)
                } else {
                    debug!(identifier, limit = self.limit, "fixed window limit exceeded");
                    Decision::rejected()
                }
            }
            // First observation, or the stored window has rolled over.
            _ => {
                storage.insert(
                    identifier.to_string(),
                    WindowRecord {
                        count: 1,
                        window_start: current,
                    },
                );
                trace!(identifier, window_start = ?current, "opened window");
                Decision::admitted(self.limit - 1)
            }
        }
    }

    async fn stop(&self) {
        self.sweeper.stop().await;
    }

    fn tracked_identifiers(&self) -> usize {
        self.storage.read().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use futures::future::join_all;

    fn manual_strategy(limit: u32, window_ms: u64) -> (FixedWindow, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new());
        let strategy = FixedWindow::with_clock(
            limit,
            Duration::from_millis(window_ms),
            Arc::clone(&clock) as Arc<dyn Clock>,
        );
        (strategy, clock)
    }

    #[tokio::test]
    async fn admits_up_to_limit_then_rejects() {
        let (strategy, _clock) = manual_strategy(3, 1000);

        assert_eq!(strategy.is_request_allowed("u1"), Decision::admitted(2));
        assert_eq!(strategy.is_request_allowed("u1"), Decision::admitted(1));
        assert_eq!(strategy.is_request_allowed("u1"), Decision::admitted(0));
        assert_eq!(strategy.is_request_allowed("u1"), Decision::rejected());

        strategy.stop().await;
    }

    #[tokio::test]
    async fn window_rollover_restores_full_quota() {
        let (strategy, clock) = manual_strategy(3, 1000);

        for _ in 0..3 {
            assert!(strategy.is_request_allowed("u1").allowed);
        }
        assert!(!strategy.is_request_allowed("u1").allowed);

        clock.advance(Duration::from_millis(1000));
        assert_eq!(strategy.is_request_allowed("u1"), Decision::admitted(2));

        strategy.stop().await;
    }

    #[tokio::test]
    async fn boundary_burst_admits_double_quota() {
        // The known fixed-window artifact: limit requests just before a
        // boundary plus limit just after all succeed.
        let (strategy, clock) = manual_strategy(5, 100);

        clock.advance(Duration::from_millis(99));
        for _ in 0..5 {
            assert!(strategy.is_request_allowed("burst").allowed);
        }
        assert!(!strategy.is_request_allowed("burst").allowed);

        clock.advance(Duration::from_millis(2));
        for _ in 0..5 {
            assert!(strategy.is_request_allowed("burst").allowed);
        }
        assert!(!strategy.is_request_allowed("burst").allowed);

        strategy.stop().await;
    }

    #[tokio::test]
    async fn identifiers_are_limited_independently() {
        let (strategy, _clock) = manual_strategy(1, 1000);

        assert!(strategy.is_request_allowed("u1").allowed);
        assert!(strategy.is_request_allowed("u2").allowed);
        assert!(!strategy.is_request_allowed("u1").allowed);
        assert!(!strategy.is_request_allowed("u2").allowed);

        strategy.stop().await;
    }

    #[tokio::test]
    async fn concrete_scenario_limit_one() {
        let (strategy, clock) = manual_strategy(1, 100);

        assert_eq!(strategy.is_request_allowed("u1"), Decision::admitted(0));
        clock.advance(Duration::from_millis(10));
        assert_eq!(strategy.is_request_allowed("u1"), Decision::rejected());
        clock.advance(Duration::from_millis(150));
        assert_eq!(strategy.is_request_allowed("u1"), Decision::admitted(0));

        strategy.stop().await;
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_checks_admit_exactly_limit() {
        let limit = 50;
        let strategy = Arc::new(FixedWindow::with_clock(
            limit,
            Duration::from_secs(3600),
            Arc::new(ManualClock::new()) as Arc<dyn Clock>,
        ));

        let tasks = (0..200).map(|_| {
            let strategy = Arc::clone(&strategy);
            tokio::spawn(async move { strategy.is_request_allowed("shared").allowed })
        });
        let results = join_all(tasks).await;
        let admitted = results
            .into_iter()
            .filter(|r| *r.as_ref().unwrap())
            .count();

        assert_eq!(admitted as u32, limit);
        strategy.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn sweep_removes_only_expired_records() {
        let clock = Arc::new(ManualClock::new());
        let strategy = FixedWindow::with_sweep_interval(
            5,
            Duration::from_millis(100),
            Duration::from_millis(200),
            Arc::clone(&clock) as Arc<dyn Clock>,
        );

        assert!(strategy.is_request_allowed("stale").allowed);
        assert_eq!(strategy.tracked_identifiers(), 1);

        // "stale" falls out of the current window; "fresh" is checked inside it.
        clock.advance(Duration::from_millis(250));
        assert!(strategy.is_request_allowed("fresh").allowed);
        assert_eq!(strategy.tracked_identifiers(), 2);

        tokio::time::advance(Duration::from_millis(200)).await;
        tokio::task::yield_now().await;

        assert_eq!(strategy.tracked_identifiers(), 1);
        // A fresh check for the swept identifier starts a new window.
        assert_eq!(strategy.is_request_allowed("stale"), Decision::admitted(4));

        strategy.stop().await;
    }

    #[tokio::test]
    async fn stop_is_bounded_and_leaves_decisions_intact() {
        let (strategy, _clock) = manual_strategy(2, 1000);

        assert!(strategy.is_request_allowed("u1").allowed);
        tokio::time::timeout(Duration::from_secs(1), strategy.stop())
            .await
            .expect("stop should return promptly");

        // State is untouched by shutdown: one quota unit is still available.
        assert_eq!(strategy.is_request_allowed("u1"), Decision::admitted(0));
        assert_eq!(strategy.is_request_allowed("u1"), Decision::rejected());
    }
}

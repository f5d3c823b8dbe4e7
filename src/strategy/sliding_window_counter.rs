//! Sliding window counter strategy: two adjacent fixed windows with linear
//! interpolation.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::RwLock;
use tracing::{debug, trace};

use crate::clock::{Clock, SystemClock};

use super::{window_start, Decision, Sweeper, WindowStrategy};

/// Admission count inside one clock-aligned sub-window.
#[derive(Debug, Clone, Copy, Default)]
struct WindowCount {
    count: u32,
    window_start: Duration,
}

/// Per-identifier state: the current sub-window and the immediately
/// preceding one.
#[derive(Debug, Clone, Copy)]
struct CounterRecord {
    current: WindowCount,
    previous: WindowCount,
}

/// Approximates a true sliding window in O(1) space and time per identifier.
///
/// The previous sub-window's count decays linearly as the current sub-window
/// elapses: the admission estimate is
/// `previous.count × (1 − elapsed_fraction) + current.count`. The
/// interpolation is a deliberate approximation, trading exactness for
/// constant-size state.
pub struct SlidingWindowCounter {
    limit: u32,
    window: Duration,
    clock: Arc<dyn Clock>,
    storage: Arc<RwLock<HashMap<String, CounterRecord>>>,
    sweeper: Sweeper,
}

impl SlidingWindowCounter {
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

/// Remove identifiers whose current sub-window has fully lapsed without a
/// subsequent rollover.
fn sweep(storage: &RwLock<HashMap<String, CounterRecord>>, now: Duration, window: Duration) {
    let current = window_start(now, window);
    let mut storage = storage.write();
    let before = storage.len();
    storage.retain(|_, record| record.current.window_start >= current);
    let removed = before - storage.len();
    if removed > 0 {
        debug!(removed, "swept lapsed sliding-window-counter records");
    }
}

#[async_trait]
impl WindowStrategy for SlidingWindowCounter {
    fn is_request_allowed(&self, identifier: &str) -> Decision {
        let now = self.clock.now();
        let current_start = window_start(now, self.window);

        let mut storage = self.storage.write();
        let record = match storage.get_mut(identifier) {
            Some(record) => record,
            None => {
                storage.insert(
                    identifier.to_string(),
                    CounterRecord {
                        current: WindowCount {
                            count: 1,
                            window_start: current_start,
                        },
                        previous: WindowCount::default(),
                    },
                );
                trace!(identifier, window_start = ?current_start, "opened window");
                return Decision::admitted(self.limit - 1);
            }
        };

        if current_start > record.current.window_start {
            // Roll over. Counts older than the immediately preceding
            // sub-window no longer contribute to the estimate.
            let gap = current_start - record.current.window_start;
            record.previous = if gap == self.window {
                record.current
            } else {
                WindowCount::default()
            };
            record.current = WindowCount {
                count: 1,
                window_start: current_start,
            };
            trace!(identifier, window_start = ?current_start, "rolled over");
            return Decision::admitted(self.limit - 1);
        }

        let elapsed_fraction =
            (now - current_start).as_secs_f64() / self.window.as_secs_f64();
        let estimate =
            record.previous.count as f64 * (1.0 - elapsed_fraction) + record.current.count as f64;

        if estimate < self.limit as f64 {
            record.current.count += 1;
            // Truncate the fractional estimate toward zero; ties at exact
            // boundaries round down.
            let remaining = self
                .limit
                .saturating_sub(estimate as u32)
                .saturating_sub(1);
            trace!(identifier, estimate, "admitted");
            Decision::admitted(remaining)
        } else {
            debug!(identifier, estimate, limit = self.limit, "estimate at limit");
            Decision::rejected()
        }
    }

    async fn stop(&self) {
        self.sweeper.stop().await;
    }

    fn tracked_identifiers(&self) -> usize {
        self.storage.read().len()
    }
}

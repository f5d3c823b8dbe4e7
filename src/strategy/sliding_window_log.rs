//! Sliding window log strategy: exact trailing-window semantics.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::RwLock;
use tracing::{debug, trace};

use crate::clock::{Clock, SystemClock};

use super::{Decision, Sweeper, WindowStrategy};

type Timestamps = VecDeque<Duration>;

/// Keeps one admission timestamp per request still inside the trailing
/// window, oldest first.
///
/// This is the exact formulation: no boundary-burst artifact, at the cost of
/// O(limit) memory per identifier and O(limit) work per check.
pub struct SlidingWindowLog {
    limit: u32,
    window: Duration,
    clock: Arc<dyn Clock>,
    storage: Arc<RwLock<HashMap<String, Timestamps>>>,
    sweeper: Sweeper,
}

impl SlidingWindowLog {
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

/// Drop timestamps that have aged out of the trailing window. The list is
/// time-ordered, so pruning walks from the front.
fn prune(timestamps: &mut Timestamps, now: Duration, window: Duration) {
    while timestamps
        .front()
        .is_some_and(|&ts| now.saturating_sub(ts) >= window)
    {
        timestamps.pop_front();
    }
}

/// Prune every identifier's log and delete identifiers left empty.
fn sweep(storage: &RwLock<HashMap<String, Timestamps>>, now: Duration, window: Duration) {
    let mut storage = storage.write();
    let before = storage.len();
    storage.retain(|_, timestamps| {
        prune(timestamps, now, window);
        !timestamps.is_empty()
    });
    let removed = before - storage.len();
    if removed > 0 {
        debug!(removed, "swept idle sliding-window-log records");
    }
}

#[async_trait]
impl WindowStrategy for SlidingWindowLog {
    fn is_request_allowed(&self, identifier: &str) -> Decision {
        let now = self.clock.now();

        let mut storage = self.storage.write();
        let timestamps = storage.entry(identifier.to_string()).or_default();
        prune(timestamps, now, self.window);

        if (timestamps.len() as u32) < self.limit {
            timestamps.push_back(now);
            let remaining = self.limit - timestamps.len() as u32;
            trace!(identifier, logged = timestamps.len(), "admitted");
            Decision::admitted(remaining)
        } else {
            debug!(identifier, limit = self.limit, "sliding window log full");
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

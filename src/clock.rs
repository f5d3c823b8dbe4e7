//! Clock abstraction for deterministic window-boundary testing.
//!
//! Strategies never read the wall clock directly. They hold an
//! `Arc<dyn Clock>` and source "now" exclusively through it, so every window
//! boundary can be reproduced in tests by swapping in a [`ManualClock`].

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use parking_lot::Mutex;

/// A source of the current instant, expressed as time elapsed since the
/// clock's epoch.
pub trait Clock: Send + Sync {
    /// Elapsed time since this clock's epoch.
    fn now(&self) -> Duration;
}

/// Production clock backed by the system wall clock.
///
/// Reports time elapsed since the Unix epoch.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Duration {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
    }
}

/// Test clock holding an explicit instant that only moves when told to.
///
/// The epoch is the moment of construction (or the instant passed to
/// [`ManualClock::starting_at`]). Advancing has no side effects beyond the
/// stored instant, which makes window rollovers fully deterministic.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: Mutex<Duration>,
}

impl ManualClock {
    /// Create a clock whose current instant is zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a clock whose current instant is `start`.
    pub fn starting_at(start: Duration) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    /// Move the clock forward by `step`.
    pub fn advance(&self, step: Duration) {
        let mut now = self.now.lock();
        *now += step;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Duration {
        *self.now.lock()
    }
}

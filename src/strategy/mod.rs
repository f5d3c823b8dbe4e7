//! Window strategies sharing one admission contract.
//!
//! Each strategy owns a map from identifier to its record type, guarded by a
//! single reader/writer lock per instance, and a background sweeper that
//! reclaims records for identifiers whose window has fully expired. Admission
//! checks take the write lock because every check potentially mutates a
//! record; introspection takes the read lock.

use std::time::Duration;

use async_trait::async_trait;

mod fixed_window;
mod sliding_window_counter;
mod sliding_window_log;
mod sweeper;

pub use fixed_window::FixedWindow;
pub use sliding_window_counter::SlidingWindowCounter;
pub use sliding_window_log::SlidingWindowLog;

pub(crate) use sweeper::Sweeper;

/// The outcome of a single admission check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Decision {
    /// Whether the request is admitted
    pub allowed: bool,
    /// Quota units left to the identifier in the current evaluation
    pub remaining: u32,
}

impl Decision {
    pub(crate) fn admitted(remaining: u32) -> Self {
        Self {
            allowed: true,
            remaining,
        }
    }

    pub(crate) fn rejected() -> Self {
        Self {
            allowed: false,
            remaining: 0,
        }
    }
}

/// Contract shared by every window strategy.
///
/// Per-identifier updates are sequentially consistent: all checks for one
/// strategy instance go through the same lock, so each check observes the
/// effect of every prior check for that identifier. No ordering guarantee
/// exists across different identifiers.
#[async_trait]
pub trait WindowStrategy: Send + Sync {
    /// Decide whether a request under `identifier` is admitted, and how much
    /// quota remains.
    fn is_request_allowed(&self, identifier: &str) -> Decision;

    /// Signal the background sweeper and wait for it to exit.
    ///
    /// Returns immediately when called more than once. After this returns, no
    /// further background mutation of the storage occurs.
    async fn stop(&self);

    /// Number of identifiers currently tracked in storage.
    fn tracked_identifiers(&self) -> usize;
}

/// The start of the clock-aligned window containing `now`.
///
/// Integer floor division on nanoseconds, so windows are fixed buckets
/// aligned to the clock's epoch rather than to the first request.
pub(crate) fn window_start(now: Duration, window: Duration) -> Duration {
    let window_ns = window.as_nanos();
    let start_ns = (now.as_nanos() / window_ns) * window_ns;
    Duration::from_nanos(start_ns as u64)
}

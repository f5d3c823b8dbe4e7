//! The limiter facade consumed by adapters.

use std::sync::Arc;

use tracing::debug;

use crate::clock::{Clock, SystemClock};
use crate::config::{LimiterConfig, StrategyKind};
use crate::error::Result;
use crate::strategy::{
    Decision, FixedWindow, SlidingWindowCounter, SlidingWindowLog, WindowStrategy,
};

/// A thin wrapper holding one window strategy, chosen at construction.
///
/// Adapters consume exactly two capabilities: [`Limiter::is_request_allowed`]
/// and [`Limiter::stop`]. Internal storage is never exposed.
pub struct Limiter {
    strategy: Arc<dyn WindowStrategy>,
}

impl Limiter {
    /// Wrap an already-constructed strategy.
    pub fn new(strategy: Arc<dyn WindowStrategy>) -> Self {
        Self { strategy }
    }

    /// Build a limiter from configuration, using the system clock.
    ///
    /// Must be called within a Tokio runtime: the strategy spawns its
    /// background sweeper here.
    pub fn from_config(config: &LimiterConfig) -> Result<Self> {
        Self::from_config_with_clock(config, Arc::new(SystemClock))
    }

    /// Build a limiter from configuration with an injected clock, for
    /// deterministic tests.
    ///
    /// Must be called within a Tokio runtime.
    pub fn from_config_with_clock(config: &LimiterConfig, clock: Arc<dyn Clock>) -> Result<Self> {
        config.validate()?;

        let limit = config.limit;
        let window = config.window();
        let sweep_interval = config.sweep_interval();

        debug!(
            strategy = %config.strategy,
            limit,
            window = ?window,
            "Building limiter"
        );

        let strategy: Arc<dyn WindowStrategy> = match config.strategy {
            StrategyKind::FixedWindow => Arc::new(FixedWindow::with_sweep_interval(
                limit,
                window,
                sweep_interval,
                clock,
            )),
            StrategyKind::SlidingWindowLog => Arc::new(SlidingWindowLog::with_sweep_interval(
                limit,
                window,
                sweep_interval,
                clock,
            )),
            StrategyKind::SlidingWindowCounter => Arc::new(
                SlidingWindowCounter::with_sweep_interval(limit, window, sweep_interval, clock),
            ),
        };

        Ok(Self::new(strategy))
    }

    /// Decide whether a request under `identifier` is admitted, and how much
    /// quota remains.
    pub fn is_request_allowed(&self, identifier: &str) -> Decision {
        self.strategy.is_request_allowed(identifier)
    }

    /// Stop the owned strategy's background sweeper and wait for it to exit.
    ///
    /// The owning process calls this once during shutdown; repeated calls
    /// return immediately.
    pub async fn stop(&self) {
        self.strategy.stop().await;
    }
}

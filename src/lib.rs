//! Turnstile - In-Process Request Admission Engine
//!
//! This crate decides whether a request identified by an opaque key (typically
//! a client address) is allowed within a configured time window, and reports
//! how much quota remains. Three window strategies share one contract: fixed
//! window, sliding window log, and sliding window counter. Each strategy owns
//! its per-identifier storage and runs a background sweeper that reclaims
//! state for identifiers with no current-window activity.
//!
//! ```no_run
//! use turnstile::{Limiter, LimiterConfig, StrategyKind};
//!
//! # async fn demo() -> turnstile::Result<()> {
//! let config = LimiterConfig::new(StrategyKind::FixedWindow, 100, 1_000);
//! let limiter = Limiter::from_config(&config)?;
//!
//! let decision = limiter.is_request_allowed("192.0.2.1");
//! assert!(decision.allowed);
//!
//! limiter.stop().await;
//! # Ok(())
//! # }
//! ```

pub mod clock;
pub mod config;
pub mod error;
pub mod limiter;
#[cfg(feature = "axum")]
pub mod middleware;
pub mod strategy;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{LimiterConfig, StrategyKind};
pub use error::{Result, TurnstileError};
pub use limiter::Limiter;
pub use strategy::{Decision, WindowStrategy};

//! Error types for the Turnstile engine.

use thiserror::Error;

/// Main error type for Turnstile operations.
///
/// All variants surface at construction time: admission checks themselves are
/// infallible, and a rejected request is an expected outcome rather than an
/// error.
#[derive(Error, Debug)]
pub enum TurnstileError {
    /// The configured strategy name matches none of the known strategies
    #[error("unknown window strategy: {0:?}")]
    UnknownStrategy(String),

    /// The configured limit is zero
    #[error("limit must be a positive integer")]
    InvalidLimit,

    /// The configured window size is zero
    #[error("window size must be a positive duration")]
    InvalidWindow,

    /// The configured sweep interval is zero
    #[error("sweep interval must be a positive duration")]
    InvalidSweepInterval,

    /// Configuration parsing errors
    #[error("configuration error: {0}")]
    Config(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for Turnstile operations.
pub type Result<T> = std::result::Result<T, TurnstileError>;

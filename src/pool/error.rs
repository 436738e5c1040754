//! Pool error types.

use std::time::Duration;

use thiserror::Error;

/// Result type for pool operations.
pub type PoolResult<T> = Result<T, PoolError>;

/// Errors that can occur while building or using a pool.
#[derive(Debug, Error)]
pub enum PoolError {
    /// The configuration failed validation.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// The selected handle could not be brought back to health.
    #[error("connection {index} unavailable after {attempts} connect attempt(s): {reason}")]
    Unavailable {
        index: usize,
        attempts: u32,
        reason: String,
    },

    /// The acquire deadline passed.
    #[error("timed out after {waited:?} waiting for a connection")]
    Timeout { waited: Duration },

    /// A configuration file could not be parsed.
    #[error("config parse error: {0}")]
    Config(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl PoolError {
    /// Check if retrying the acquire later may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, PoolError::Unavailable { .. } | PoolError::Timeout { .. })
    }

    /// Check if this error is a deadline expiry.
    pub fn is_timeout(&self) -> bool {
        matches!(self, PoolError::Timeout { .. })
    }
}

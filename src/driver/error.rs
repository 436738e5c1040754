//! Driver error types.

use thiserror::Error;

/// Result type for driver operations.
pub type DriverResult<T> = Result<T, DriverError>;

/// Errors reported by a database driver.
#[derive(Debug, Clone, Error)]
pub enum DriverError {
    /// The link to the server could not be established.
    #[error("connect failed: {0}")]
    Connect(String),

    /// The server rejected or failed a statement.
    #[error("query failed: {0}")]
    Query(String),

    /// A statement was issued on a disconnected session.
    #[error("not connected")]
    NotConnected,

    /// The link was closed by the server or the network.
    #[error("link closed")]
    Closed,
}

impl DriverError {
    /// Check if this error means the link itself is unusable.
    pub fn is_link_failure(&self) -> bool {
        matches!(
            self,
            DriverError::Connect(_) | DriverError::NotConnected | DriverError::Closed
        )
    }
}

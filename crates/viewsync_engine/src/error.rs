//! Error types for the sync engine.

use thiserror::Error;

/// Result type for sync operations.
pub type SyncResult<T> = Result<T, SyncError>;

/// Errors that can occur during a sync exchange.
///
/// Nothing here is fatal: every variant degrades to "skip this cycle and
/// let the next debounced push or scheduled pull try again". There is no
/// per-operation retry machinery because periodic polling already
/// provides eventual retry.
#[derive(Error, Debug)]
pub enum SyncError {
    /// Network failure or timeout while talking to the exchange point.
    #[error("transport error: {0}")]
    Transport(String),

    /// The exchange point answered with a non-success status.
    #[error("exchange returned status {0}")]
    Status(u16),

    /// Unparseable body or wrong payload shape.
    #[error("malformed payload: {0}")]
    Malformed(String),
}

impl SyncError {
    /// Creates a transport error.
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport(message.into())
    }

    /// Creates a malformed-payload error.
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::Malformed(message.into())
    }

    /// Returns true if the failure happened below the payload layer.
    pub fn is_transport(&self) -> bool {
        matches!(self, SyncError::Transport(_) | SyncError::Status(_))
    }
}

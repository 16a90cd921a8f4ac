//! Error types for the exchange server.

use thiserror::Error;

/// Result type for server operations.
pub type ServerResult<T> = Result<T, ServerError>;

/// Errors that can occur while running the exchange server.
///
/// Only the persistence paths produce errors; request handling maps
/// malformed input straight to client-error responses.
#[derive(Error, Debug)]
pub enum ServerError {
    /// Filesystem failure while loading or saving the replica.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// The replica file does not contain a JSON object.
    #[error("replica data error: {0}")]
    Data(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = ServerError::from(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "missing",
        ));
        assert!(err.to_string().contains("missing"));
    }
}

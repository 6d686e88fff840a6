//! Store errors
//!
//! Every failure talking to the key-value service surfaces as a `StoreError`.
//! `Unavailable` and `Timeout` form the "store unavailable" class: they are
//! propagated to the caller verbatim and never retried.

use thiserror::Error;

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Key-value store errors
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StoreError {
    /// Connection lost, refused, or the service rejected the command
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    /// The caller-supplied deadline expired before the store answered
    #[error("Store call timed out: {0}")]
    Timeout(String),

    /// A key holds a structure of a different type than the command expects
    #[error("Wrong type for key '{0}'")]
    WrongType(String),

    /// The store does not offer the requested primitive
    #[error("Unsupported store operation: {0}")]
    Unsupported(String),

    /// A stored payload could not be decoded
    #[error("Codec error for key '{key}': {reason}")]
    Codec { key: String, reason: String },
}

impl StoreError {
    /// Create an unavailable error
    pub fn unavailable(reason: impl Into<String>) -> Self {
        StoreError::Unavailable(reason.into())
    }

    /// Create a timeout error
    pub fn timeout(operation: impl Into<String>) -> Self {
        StoreError::Timeout(operation.into())
    }

    /// Create a codec error
    pub fn codec(key: impl Into<String>, reason: impl Into<String>) -> Self {
        StoreError::Codec {
            key: key.into(),
            reason: reason.into(),
        }
    }

    /// Returns true for connection-level failures (including timeouts)
    pub fn is_unavailable(&self) -> bool {
        matches!(self, StoreError::Unavailable(_) | StoreError::Timeout(_))
    }

    /// Stable error code for logs
    pub fn code(&self) -> &'static str {
        match self {
            StoreError::Unavailable(_) => "KVIDX_STORE_UNAVAILABLE",
            StoreError::Timeout(_) => "KVIDX_STORE_TIMEOUT",
            StoreError::WrongType(_) => "KVIDX_STORE_WRONG_TYPE",
            StoreError::Unsupported(_) => "KVIDX_STORE_UNSUPPORTED",
            StoreError::Codec { .. } => "KVIDX_STORE_CODEC",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unavailable_class() {
        assert!(StoreError::unavailable("connection reset").is_unavailable());
        assert!(StoreError::timeout("smembers").is_unavailable());
        assert!(!StoreError::WrongType("k".into()).is_unavailable());
        assert!(!StoreError::codec("k", "bad json").is_unavailable());
    }

    #[test]
    fn test_error_display() {
        let err = StoreError::codec("Product:1", "expected value");
        let display = format!("{}", err);
        assert!(display.contains("Product:1"));
        assert!(display.contains("expected value"));
        assert_eq!(err.code(), "KVIDX_STORE_CODEC");
    }
}

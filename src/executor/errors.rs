//! Executor error types
//!
//! Error codes:
//! - KVIDX_EXECUTION_STORE_FAILED (ERROR): a lookup or fetch failed at the
//!   store; no partial result is returned
//! - KVIDX_DATA_CORRUPTION (ERROR): a primary document could not be decoded
//!
//! Stale index entries are not errors.

use std::fmt;

use crate::store::StoreError;

/// Severity levels for executor errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Query failed, state untouched
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "ERROR"),
        }
    }
}

/// Executor-specific error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutorErrorCode {
    /// Store call failed or timed out
    StoreFailed,
    /// Stored document does not decode
    DataCorruption,
}

impl ExecutorErrorCode {
    /// Returns the string code
    pub fn code(&self) -> &'static str {
        match self {
            ExecutorErrorCode::StoreFailed => "KVIDX_EXECUTION_STORE_FAILED",
            ExecutorErrorCode::DataCorruption => "KVIDX_DATA_CORRUPTION",
        }
    }

    /// Returns the severity level for this error
    pub fn severity(&self) -> Severity {
        Severity::Error
    }
}

impl fmt::Display for ExecutorErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Executor error type with full context
#[derive(Debug, Clone)]
pub struct ExecutorError {
    code: ExecutorErrorCode,
    message: String,
    source: StoreError,
}

impl ExecutorError {
    /// Wraps a store failure during `operation`
    pub fn store_failed(operation: &str, source: StoreError) -> Self {
        let code = match source {
            StoreError::Codec { .. } => ExecutorErrorCode::DataCorruption,
            _ => ExecutorErrorCode::StoreFailed,
        };
        Self {
            code,
            message: format!("{} failed: {}", operation, source),
            source,
        }
    }

    /// Returns the error code
    pub fn code(&self) -> ExecutorErrorCode {
        self.code
    }

    /// Returns the severity level
    pub fn severity(&self) -> Severity {
        self.code.severity()
    }

    /// Returns the error message
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns the underlying store error
    pub fn store_error(&self) -> &StoreError {
        &self.source
    }

    /// Returns true when the store was unreachable or too slow
    pub fn is_store_unavailable(&self) -> bool {
        self.source.is_unavailable()
    }
}

impl fmt::Display for ExecutorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {}: {}",
            self.code.severity(),
            self.code.code(),
            self.message
        )
    }
}

impl std::error::Error for ExecutorError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.source)
    }
}

/// Result type for executor operations
pub type ExecutorResult<T> = Result<T, ExecutorError>;

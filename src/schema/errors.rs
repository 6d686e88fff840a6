//! Schema error types
//!
//! Error codes:
//! - KVIDX_SCHEMA_INVALID_INDEX (REJECT)
//! - KVIDX_SCHEMA_CONFLICT (REJECT)
//! - KVIDX_UNKNOWN_COLLECTION (REJECT)

use std::fmt;

/// Severity levels for schema errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Registration or request rejected
    Reject,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Reject => write!(f, "REJECT"),
        }
    }
}

/// Schema-specific error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaErrorCode {
    /// Index requested on an attribute that cannot carry it
    InvalidIndex,
    /// Collection already registered with a different model
    Conflict,
    /// Collection never registered
    UnknownCollection,
}

impl SchemaErrorCode {
    /// Returns the string code
    pub fn code(&self) -> &'static str {
        match self {
            SchemaErrorCode::InvalidIndex => "KVIDX_SCHEMA_INVALID_INDEX",
            SchemaErrorCode::Conflict => "KVIDX_SCHEMA_CONFLICT",
            SchemaErrorCode::UnknownCollection => "KVIDX_UNKNOWN_COLLECTION",
        }
    }

    /// Returns the severity level for this error
    pub fn severity(&self) -> Severity {
        Severity::Reject
    }
}

impl fmt::Display for SchemaErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Schema error type with full context
#[derive(Debug, Clone)]
pub struct SchemaError {
    code: SchemaErrorCode,
    message: String,
    collection: String,
    field: Option<String>,
}

impl SchemaError {
    /// Create an invalid index error
    pub fn invalid_index(
        collection: impl Into<String>,
        field: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        let collection = collection.into();
        let field = field.into();
        Self {
            code: SchemaErrorCode::InvalidIndex,
            message: format!(
                "Field '{}' of '{}' cannot be indexed: {}",
                field,
                collection,
                reason.into()
            ),
            collection,
            field: Some(field),
        }
    }

    /// Create a conflicting registration error
    pub fn conflict(collection: impl Into<String>) -> Self {
        let collection = collection.into();
        Self {
            code: SchemaErrorCode::Conflict,
            message: format!(
                "Collection '{}' is already registered with a different model",
                collection
            ),
            collection,
            field: None,
        }
    }

    /// Create an unknown collection error
    pub fn unknown_collection(collection: impl Into<String>) -> Self {
        let collection = collection.into();
        Self {
            code: SchemaErrorCode::UnknownCollection,
            message: format!("Collection '{}' is not registered", collection),
            collection,
            field: None,
        }
    }

    /// Returns the error code
    pub fn code(&self) -> SchemaErrorCode {
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

    /// Returns the collection name
    pub fn collection(&self) -> &str {
        &self.collection
    }

    /// Returns the field name if applicable
    pub fn field(&self) -> Option<&str> {
        self.field.as_deref()
    }
}

impl fmt::Display for SchemaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.code.severity(), self.code.code(), self.message)
    }
}

impl std::error::Error for SchemaError {}

/// Result type for schema operations
pub type SchemaResult<T> = Result<T, SchemaError>;

//! Planner error types
//!
//! Error codes:
//! - KVIDX_QUERY_INVALID (REJECT)
//! - KVIDX_QUERY_UNINDEXED_FIELD (REJECT)
//! - KVIDX_QUERY_UNSUPPORTED_OPERATOR (REJECT)
//! - KVIDX_QUERY_INVALID_VALUE (REJECT)
//! - KVIDX_UNKNOWN_COLLECTION (REJECT)
//!
//! Every planner error is raised before the store is contacted.

use std::fmt;

use serde_json::Value;

use crate::index::json_type_name;
use crate::schema::IndexKind;

use super::ast::Operator;

/// Severity levels for planner errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Client request rejected
    Reject,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Reject => write!(f, "REJECT"),
        }
    }
}

/// Planner-specific error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlannerErrorCode {
    /// Malformed filter
    QueryInvalid,
    /// Filter on a field without an index
    UnindexedField,
    /// Operator the field's index cannot answer
    UnsupportedOperator,
    /// Operand the field's index cannot compare against
    InvalidValue,
    /// Collection never registered
    UnknownCollection,
}

impl PlannerErrorCode {
    /// Returns the string code
    pub fn code(&self) -> &'static str {
        match self {
            PlannerErrorCode::QueryInvalid => "KVIDX_QUERY_INVALID",
            PlannerErrorCode::UnindexedField => "KVIDX_QUERY_UNINDEXED_FIELD",
            PlannerErrorCode::UnsupportedOperator => "KVIDX_QUERY_UNSUPPORTED_OPERATOR",
            PlannerErrorCode::InvalidValue => "KVIDX_QUERY_INVALID_VALUE",
            PlannerErrorCode::UnknownCollection => "KVIDX_UNKNOWN_COLLECTION",
        }
    }

    /// Returns the severity level for this error
    pub fn severity(&self) -> Severity {
        Severity::Reject
    }
}

impl fmt::Display for PlannerErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Planner error type with full context
#[derive(Debug, Clone)]
pub struct PlannerError {
    code: PlannerErrorCode,
    message: String,
    field: Option<String>,
}

impl PlannerError {
    /// Create a query invalid error
    pub fn query_invalid(reason: impl Into<String>) -> Self {
        Self {
            code: PlannerErrorCode::QueryInvalid,
            message: reason.into(),
            field: None,
        }
    }

    /// Create an unindexed field error
    pub fn unindexed_field(collection: &str, field: impl Into<String>) -> Self {
        let f = field.into();
        Self {
            code: PlannerErrorCode::UnindexedField,
            message: format!("Field '{}' of '{}' is not indexed", f, collection),
            field: Some(f),
        }
    }

    /// Create an unsupported operator error
    pub fn unsupported_operator(field: impl Into<String>, op: Operator, kind: IndexKind) -> Self {
        let f = field.into();
        Self {
            code: PlannerErrorCode::UnsupportedOperator,
            message: format!(
                "Operator '{}' is not supported on {} field '{}'",
                op.as_str(),
                kind,
                f
            ),
            field: Some(f),
        }
    }

    /// Create an invalid operand error
    pub fn invalid_value(field: impl Into<String>, value: &Value, expected: &str) -> Self {
        let f = field.into();
        Self {
            code: PlannerErrorCode::InvalidValue,
            message: format!(
                "Field '{}' must be compared with {}, got {}",
                f,
                expected,
                json_type_name(value)
            ),
            field: Some(f),
        }
    }

    /// Create an unknown collection error
    pub fn unknown_collection(collection: impl Into<String>) -> Self {
        Self {
            code: PlannerErrorCode::UnknownCollection,
            message: format!("Collection '{}' is not registered", collection.into()),
            field: None,
        }
    }

    /// Returns the error code
    pub fn code(&self) -> PlannerErrorCode {
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

    /// Returns the field name if applicable
    pub fn field(&self) -> Option<&str> {
        self.field.as_deref()
    }
}

impl fmt::Display for PlannerError {
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

impl std::error::Error for PlannerError {}

/// Result type for planner operations
pub type PlannerResult<T> = Result<T, PlannerError>;

//! Index error types
//!
//! Error codes:
//! - KVIDX_UNSUPPORTED_VALUE (REJECT): value cannot be converted for its
//!   index; raised before any store mutation for the document event
//! - KVIDX_INDEX_MAINTENANCE_FAILED (ERROR): a store command failed after the
//!   primary write committed; index state may be partially applied
//! - KVIDX_COLLECTION_MISMATCH (REJECT): document handed to the maintainer
//!   of another collection
//! - KVIDX_RESERVED_DOCUMENT_ID (REJECT): id collides with the collection's
//!   membership key

use std::fmt;

use crate::store::StoreError;

/// Severity levels for index errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Event rejected, nothing written to the indexes
    Reject,
    /// Indexes may disagree with primary storage
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Reject => write!(f, "REJECT"),
            Severity::Error => write!(f, "ERROR"),
        }
    }
}

/// Index-specific error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexErrorCode {
    /// Attribute value has no representation in its index
    UnsupportedValue,
    /// Store command failed during maintenance
    MaintenanceFailed,
    /// Document belongs to a different collection
    CollectionMismatch,
    /// Document id is reserved by the key layout
    ReservedDocumentId,
}

impl IndexErrorCode {
    /// Returns the string code
    pub fn code(&self) -> &'static str {
        match self {
            IndexErrorCode::UnsupportedValue => "KVIDX_UNSUPPORTED_VALUE",
            IndexErrorCode::MaintenanceFailed => "KVIDX_INDEX_MAINTENANCE_FAILED",
            IndexErrorCode::CollectionMismatch => "KVIDX_COLLECTION_MISMATCH",
            IndexErrorCode::ReservedDocumentId => "KVIDX_RESERVED_DOCUMENT_ID",
        }
    }

    /// Returns the severity level for this error
    pub fn severity(&self) -> Severity {
        match self {
            IndexErrorCode::MaintenanceFailed => Severity::Error,
            _ => Severity::Reject,
        }
    }
}

impl fmt::Display for IndexErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Index error type with full context
#[derive(Debug, Clone)]
pub struct IndexError {
    code: IndexErrorCode,
    message: String,
    collection: String,
    document_id: String,
    field: Option<String>,
    /// Index targets whose commands reached the store
    applied: Vec<String>,
    /// Index targets whose commands did not
    pending: Vec<String>,
    source: Option<StoreError>,
}

impl IndexError {
    /// Create an unsupported value error
    pub fn unsupported_value(
        collection: impl Into<String>,
        document_id: impl Into<String>,
        field: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        let field = field.into();
        let document_id = document_id.into();
        Self {
            code: IndexErrorCode::UnsupportedValue,
            message: format!(
                "Field '{}' of document '{}' cannot be indexed: {}",
                field,
                document_id,
                reason.into()
            ),
            collection: collection.into(),
            document_id,
            field: Some(field),
            applied: Vec::new(),
            pending: Vec::new(),
            source: None,
        }
    }

    /// Create a maintenance failure error
    pub fn maintenance_failed(
        collection: impl Into<String>,
        document_id: impl Into<String>,
        applied: Vec<String>,
        pending: Vec<String>,
        source: StoreError,
    ) -> Self {
        let document_id = document_id.into();
        Self {
            code: IndexErrorCode::MaintenanceFailed,
            message: format!(
                "Index maintenance for document '{}' failed ({} applied, {} pending): {}",
                document_id,
                applied.len(),
                pending.len(),
                source
            ),
            collection: collection.into(),
            document_id,
            field: pending.first().cloned(),
            applied,
            pending,
            source: Some(source),
        }
    }

    /// Create a collection mismatch error
    pub fn collection_mismatch(
        expected: impl Into<String>,
        document_collection: impl Into<String>,
        document_id: impl Into<String>,
    ) -> Self {
        let expected = expected.into();
        let document_id = document_id.into();
        Self {
            code: IndexErrorCode::CollectionMismatch,
            message: format!(
                "Document '{}' of '{}' handed to the indexes of '{}'",
                document_id,
                document_collection.into(),
                expected
            ),
            collection: expected,
            document_id,
            field: None,
            applied: Vec::new(),
            pending: Vec::new(),
            source: None,
        }
    }

    /// Create a reserved id error
    pub fn reserved_document_id(
        collection: impl Into<String>,
        document_id: impl Into<String>,
        key: &str,
    ) -> Self {
        let document_id = document_id.into();
        Self {
            code: IndexErrorCode::ReservedDocumentId,
            message: format!(
                "Document id '{}' is reserved: its key '{}' holds the membership set",
                document_id, key
            ),
            collection: collection.into(),
            document_id,
            field: None,
            applied: Vec::new(),
            pending: Vec::new(),
            source: None,
        }
    }

    /// Returns the error code
    pub fn code(&self) -> IndexErrorCode {
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

    /// Returns the document identifier
    pub fn document_id(&self) -> &str {
        &self.document_id
    }

    /// Returns the offending (or first unapplied) field
    pub fn field(&self) -> Option<&str> {
        self.field.as_deref()
    }

    /// Index targets already updated when the failure happened
    pub fn applied(&self) -> &[String] {
        &self.applied
    }

    /// Index targets left untouched by the failure
    pub fn pending(&self) -> &[String] {
        &self.pending
    }

    /// Returns the store failure behind a maintenance error
    pub fn store_error(&self) -> Option<&StoreError> {
        self.source.as_ref()
    }
}

impl fmt::Display for IndexError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.code.severity(), self.code.code(), self.message)
    }
}

impl std::error::Error for IndexError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e as &(dyn std::error::Error + 'static))
    }
}

/// Result type for index operations
pub type IndexResult<T> = Result<T, IndexError>;

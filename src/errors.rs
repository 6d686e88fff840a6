//! Crate-level error
//!
//! Wraps every subsystem error. Each keeps its own code and severity; the
//! classification helpers answer the questions callers actually ask.

use thiserror::Error;

use crate::config::ConfigError;
use crate::executor::ExecutorError;
use crate::index::{IndexError, IndexErrorCode};
use crate::planner::{PlannerError, PlannerErrorCode};
use crate::schema::SchemaError;
use crate::store::StoreError;

/// Result type of the public API
pub type Result<T> = std::result::Result<T, Error>;

/// Any failure of the index engine
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error(transparent)]
    Index(#[from] IndexError),

    #[error(transparent)]
    Planner(#[from] PlannerError),

    #[error(transparent)]
    Executor(#[from] ExecutorError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("[REJECT] KVIDX_DOCUMENT_EXISTS: Document '{id}' already exists in '{collection}'")]
    DocumentExists { collection: String, id: String },

    #[error("[REJECT] KVIDX_DOCUMENT_NOT_FOUND: Document '{id}' not found in '{collection}'")]
    DocumentNotFound { collection: String, id: String },
}

impl Error {
    /// Stable error code
    pub fn code(&self) -> &'static str {
        match self {
            Error::Schema(e) => e.code().code(),
            Error::Index(e) => e.code().code(),
            Error::Planner(e) => e.code().code(),
            Error::Executor(e) => e.code().code(),
            Error::Store(e) => e.code(),
            Error::Config(_) => "KVIDX_CONFIG_INVALID",
            Error::DocumentExists { .. } => "KVIDX_DOCUMENT_EXISTS",
            Error::DocumentNotFound { .. } => "KVIDX_DOCUMENT_NOT_FOUND",
        }
    }

    /// A filter referenced a field without an index
    pub fn is_unindexed_field(&self) -> bool {
        matches!(self, Error::Planner(e) if e.code() == PlannerErrorCode::UnindexedField)
    }

    /// A document value could not be converted for its index
    pub fn is_unsupported_value(&self) -> bool {
        matches!(self, Error::Index(e) if e.code() == IndexErrorCode::UnsupportedValue)
    }

    /// Index maintenance failed after the primary write
    pub fn is_index_maintenance(&self) -> bool {
        matches!(self, Error::Index(e) if e.code() == IndexErrorCode::MaintenanceFailed)
    }

    /// The store could not be reached, or did not answer in time
    pub fn is_store_unavailable(&self) -> bool {
        match self {
            Error::Store(e) => e.is_unavailable(),
            Error::Executor(e) => e.is_store_unavailable(),
            _ => false,
        }
    }
}

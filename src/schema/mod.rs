//! Schema Registry subsystem
//!
//! Records, per document type, which attributes are indexed and how.
//!
//! # Design Principles
//!
//! - Explicit models: indexed attributes are declared on a `DocumentModel`
//!   value built once at startup
//! - Immutable descriptors: produced once per collection, never changed
//! - Deterministic: descriptors ordered by field name

mod descriptor;
mod errors;
mod registry;
mod types;

pub use descriptor::{IndexDescriptor, IndexKind};
pub use errors::{SchemaError, SchemaErrorCode, SchemaResult};
pub use registry::{build_descriptors, Descriptors, SchemaRegistry};
pub use types::{DocumentModel, FieldDef, FieldType, IndexSpec};

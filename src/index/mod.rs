//! Index maintenance
//!
//! Indexes live in the key-value store next to the documents:
//!
//! - EXACT: one set of ids per distinct value (`idx:<C>:<f>:<v>`)
//! - RANGE: one sorted set per field, id scored by the value (`idx:<C>:<f>`)
//!
//! # Invariants
//!
//! - A document with a non-null indexed value has exactly one entry for
//!   that field: the bucket of its value, or one score equal to its value
//! - A null value leaves no entry
//! - Deleting a document removes every entry it held
//! - Index writes happen after the primary write on insert/update and
//!   before the primary delete

mod errors;
mod maintainer;
mod value;

pub use errors::{IndexError, IndexErrorCode, IndexResult, Severity};
pub use maintainer::{
    HookFuture, IndexMaintainer, LifecycleHooks, MaintenancePlan, MaintenanceReport, PlannedOp,
    Target,
};
pub use value::{bucket, json_type_name, score, IndexValue};

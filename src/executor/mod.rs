//! Query executor
//!
//! Consumes lookup plans and produces documents.
//!
//! # Guarantees
//!
//! - No partial results: any store failure fails the whole query
//! - Stale index entries are skipped, counted and logged at WARN
//! - Documents are returned in id order for a given index state

mod errors;
mod executor;
mod result;

pub use errors::{ExecutorError, ExecutorErrorCode, ExecutorResult, Severity};
pub use executor::{QueryExecutor, DEFAULT_FETCH_CONCURRENCY};
pub use result::QueryResult;

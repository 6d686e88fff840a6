//! kvindex - secondary indexes over a remote key-value store
//!
//! Documents live in primary storage under `<collection>:<id>`. For every
//! indexed attribute the engine keeps either an EXACT index (one set per
//! distinct value) or a RANGE index (one sorted set scored by the value),
//! and resolves equality and range filters against them.

pub mod config;
pub mod database;
pub mod document;
pub mod errors;
pub mod executor;
pub mod index;
pub mod observability;
pub mod planner;
pub mod schema;
pub mod store;

pub use config::{ConfigError, IndexConfig};
pub use database::Database;
pub use document::{Attributes, Document};
pub use errors::{Error, Result};
pub use executor::QueryResult;
pub use index::{LifecycleHooks, MaintenanceReport};
pub use observability::MetricsSnapshot;
pub use planner::{ExplainPlan, Filter, LookupPlan, Operator, Predicate};
pub use schema::{DocumentModel, FieldDef, FieldType, IndexKind};
pub use store::{Deadline, KeySpace, KvStore, MemoryStore, StoreError};

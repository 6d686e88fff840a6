//! Counters for the index engine
//!
//! - Counters only, monotonic
//! - Reset only when the owning database is created
//! - Relaxed atomics; exact totals once writers are quiescent

use std::sync::atomic::{AtomicU64, Ordering};

/// Operational counters
#[derive(Debug, Default)]
pub struct IndexMetrics {
    /// Index store commands applied
    index_writes: AtomicU64,
    /// Maintenance runs that ended in a store failure
    maintenance_failures: AtomicU64,
    /// Queries answered
    queries_executed: AtomicU64,
    /// Queries rejected at plan time
    queries_rejected: AtomicU64,
    /// Stale index entries skipped while fetching
    stale_skipped: AtomicU64,
    /// Documents returned by queries
    documents_fetched: AtomicU64,
}

impl IndexMetrics {
    /// Create a registry with all counters at zero
    pub fn new() -> Self {
        Self::default()
    }

    /// Add applied index commands
    pub fn add_index_writes(&self, count: u64) {
        self.index_writes.fetch_add(count, Ordering::Relaxed);
    }

    /// Increment maintenance failures
    pub fn increment_maintenance_failures(&self) {
        self.maintenance_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Increment queries executed
    pub fn increment_queries_executed(&self) {
        self.queries_executed.fetch_add(1, Ordering::Relaxed);
    }

    /// Increment queries rejected
    pub fn increment_queries_rejected(&self) {
        self.queries_rejected.fetch_add(1, Ordering::Relaxed);
    }

    /// Increment stale entries skipped
    pub fn increment_stale_skipped(&self) {
        self.stale_skipped.fetch_add(1, Ordering::Relaxed);
    }

    /// Add documents returned by a query
    pub fn add_documents_fetched(&self, count: u64) {
        self.documents_fetched.fetch_add(count, Ordering::Relaxed);
    }

    /// Current counters as a JSON object
    pub fn to_json(&self) -> String {
        let s = self.snapshot();
        format!(
            r#"{{"index_writes":{},"maintenance_failures":{},"queries_executed":{},"queries_rejected":{},"stale_skipped":{},"documents_fetched":{}}}"#,
            s.index_writes,
            s.maintenance_failures,
            s.queries_executed,
            s.queries_rejected,
            s.stale_skipped,
            s.documents_fetched,
        )
    }

    /// Point-in-time copy of every counter
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            index_writes: self.index_writes.load(Ordering::Relaxed),
            maintenance_failures: self.maintenance_failures.load(Ordering::Relaxed),
            queries_executed: self.queries_executed.load(Ordering::Relaxed),
            queries_rejected: self.queries_rejected.load(Ordering::Relaxed),
            stale_skipped: self.stale_skipped.load(Ordering::Relaxed),
            documents_fetched: self.documents_fetched.load(Ordering::Relaxed),
        }
    }
}

/// A point-in-time snapshot of all counters
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub index_writes: u64,
    pub maintenance_failures: u64,
    pub queries_executed: u64,
    pub queries_rejected: u64,
    pub stale_skipped: u64,
    pub documents_fetched: u64,
}

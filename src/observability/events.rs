//! Observable events of the index engine
//!
//! Events are explicit and typed; each carries its log severity.

use std::fmt;

use super::logger::Severity;

/// Observable events
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    // Configuration & schema
    /// Configuration parsed and validated
    ConfigLoaded,
    /// Collection registered, descriptors built
    SchemaRegistered,

    // Document lifecycle
    /// Document stored and indexed
    DocumentInserted,
    /// Document overwritten and index diff applied
    DocumentUpdated,
    /// Index entries removed and document deleted
    DocumentDeleted,
    /// Store failure while maintaining indexes
    IndexMaintenanceFailed,

    // Queries
    /// Filter translated into lookups
    QueryPlanned,
    /// Filter rejected at plan time
    QueryRejected,
    /// Query resolved to documents
    QueryExecuted,
    /// Index entry pointed at a missing document
    StaleIndexEntrySkipped,
}

impl Event {
    /// Returns the string representation of the event
    pub fn as_str(&self) -> &'static str {
        match self {
            Event::ConfigLoaded => "CONFIG_LOADED",
            Event::SchemaRegistered => "SCHEMA_REGISTERED",
            Event::DocumentInserted => "DOCUMENT_INSERTED",
            Event::DocumentUpdated => "DOCUMENT_UPDATED",
            Event::DocumentDeleted => "DOCUMENT_DELETED",
            Event::IndexMaintenanceFailed => "INDEX_MAINTENANCE_FAILED",
            Event::QueryPlanned => "QUERY_PLANNED",
            Event::QueryRejected => "QUERY_REJECTED",
            Event::QueryExecuted => "QUERY_EXECUTED",
            Event::StaleIndexEntrySkipped => "STALE_INDEX_ENTRY_SKIPPED",
        }
    }

    /// Severity the event is logged at
    pub fn severity(&self) -> Severity {
        match self {
            Event::IndexMaintenanceFailed => Severity::Error,
            Event::QueryRejected | Event::StaleIndexEntrySkipped => Severity::Warn,
            _ => Severity::Info,
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_events_have_string_representation() {
        let events = [
            Event::ConfigLoaded,
            Event::SchemaRegistered,
            Event::DocumentInserted,
            Event::DocumentUpdated,
            Event::DocumentDeleted,
            Event::IndexMaintenanceFailed,
            Event::QueryPlanned,
            Event::QueryRejected,
            Event::QueryExecuted,
            Event::StaleIndexEntrySkipped,
        ];

        for event in events {
            let s = event.as_str();
            assert!(!s.is_empty());
            assert!(s.chars().all(|c| c.is_uppercase() || c == '_'));
        }
    }

    #[test]
    fn test_event_severity() {
        assert_eq!(Event::IndexMaintenanceFailed.severity(), Severity::Error);
        assert_eq!(Event::StaleIndexEntrySkipped.severity(), Severity::Warn);
        assert_eq!(Event::QueryExecuted.severity(), Severity::Info);
    }
}

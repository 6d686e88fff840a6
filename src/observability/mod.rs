//! Observability for the index engine
//!
//! - Structured JSON logging (`Logger`)
//! - Typed events (`Event`)
//! - Counters (`IndexMetrics`)
//!
//! Components report through an `Observer`, which pairs the shared counters
//! with the `log_events` switch from the configuration. Counters are always
//! updated; log lines only when enabled.
//!
//! ```ignore
//! let observer = Observer::new(Arc::new(IndexMetrics::new()), true);
//! observer.emit(Event::QueryExecuted, &[("collection", "Product")]);
//! ```

mod events;
mod logger;
mod metrics;

pub use events::Event;
pub use logger::{Logger, Severity};
pub use metrics::{IndexMetrics, MetricsSnapshot};

use std::sync::Arc;

/// Log an event at its own severity
pub fn log_event(event: Event, fields: &[(&str, &str)]) {
    Logger::log(event.severity(), event.as_str(), fields);
}

/// Counters plus the logging switch, shared by every component
#[derive(Debug, Clone)]
pub struct Observer {
    metrics: Arc<IndexMetrics>,
    log_events: bool,
}

impl Observer {
    /// Create an observer over shared counters
    pub fn new(metrics: Arc<IndexMetrics>, log_events: bool) -> Self {
        Self {
            metrics,
            log_events,
        }
    }

    /// Observer that counts but never logs
    pub fn silent() -> Self {
        Self::new(Arc::new(IndexMetrics::new()), false)
    }

    /// The shared counters
    pub fn metrics(&self) -> &IndexMetrics {
        &self.metrics
    }

    /// Whether log lines are written
    pub fn logs_enabled(&self) -> bool {
        self.log_events
    }

    /// Log an event if logging is enabled
    pub fn emit(&self, event: Event, fields: &[(&str, &str)]) {
        if self.log_events {
            log_event(event, fields);
        }
    }
}

impl Default for Observer {
    fn default() -> Self {
        Self::new(Arc::new(IndexMetrics::new()), true)
    }
}

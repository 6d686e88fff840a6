//! Index engine configuration
//!
//! JSON document, every field optional:
//!
//! ```json
//! {
//!   "key_prefix": "idx",
//!   "atomic_batches": true,
//!   "store_timeout_ms": 250,
//!   "fetch_concurrency": 32,
//!   "log_events": true
//! }
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::observability::{log_event, Event};
use crate::store::{Deadline, KeySpace};

/// Configuration loading errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Cannot read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid config value: {0}")]
    Invalid(String),
}

/// Index engine configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexConfig {
    /// Prefix of every index key (default: "idx")
    #[serde(default = "default_key_prefix")]
    pub key_prefix: String,

    /// Use the store's atomic batch primitive when it has one (default: true)
    #[serde(default = "default_atomic_batches")]
    pub atomic_batches: bool,

    /// Budget for the store calls of one operation (default: none)
    #[serde(default)]
    pub store_timeout_ms: Option<u64>,

    /// Document reads a query keeps in flight at once (default: 32)
    #[serde(default = "default_fetch_concurrency")]
    pub fetch_concurrency: usize,

    /// Write structured log lines (default: true)
    #[serde(default = "default_log_events")]
    pub log_events: bool,
}

fn default_key_prefix() -> String {
    crate::store::DEFAULT_INDEX_PREFIX.to_string()
}

fn default_atomic_batches() -> bool {
    true
}

fn default_fetch_concurrency() -> usize {
    32
}

fn default_log_events() -> bool {
    true
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            key_prefix: default_key_prefix(),
            atomic_batches: default_atomic_batches(),
            store_timeout_ms: None,
            fetch_concurrency: default_fetch_concurrency(),
            log_events: default_log_events(),
        }
    }
}

impl IndexConfig {
    /// Parses and validates a JSON configuration
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: IndexConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a configuration file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_json_str(&raw)?;

        if config.log_events {
            let path = path.display().to_string();
            log_event(
                Event::ConfigLoaded,
                &[("path", path.as_str()), ("key_prefix", config.key_prefix.as_str())],
            );
        }
        Ok(config)
    }

    /// Rejects values the engine cannot work with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.key_prefix.is_empty() {
            return Err(ConfigError::Invalid("key_prefix must not be empty".into()));
        }
        if self.key_prefix.contains(':') {
            return Err(ConfigError::Invalid(format!(
                "key_prefix '{}' must not contain ':'",
                self.key_prefix
            )));
        }
        if self.store_timeout_ms == Some(0) {
            return Err(ConfigError::Invalid(
                "store_timeout_ms must be positive when set".into(),
            ));
        }
        if self.fetch_concurrency == 0 {
            return Err(ConfigError::Invalid("fetch_concurrency must be positive".into()));
        }
        Ok(())
    }

    /// Builder: disable logging
    pub fn quiet(mut self) -> Self {
        self.log_events = false;
        self
    }

    /// Builder: document reads in flight per query
    pub fn with_fetch_concurrency(mut self, limit: usize) -> Self {
        self.fetch_concurrency = limit;
        self
    }

    /// Builder: per-operation store budget
    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.store_timeout_ms = Some(timeout_ms);
        self
    }

    /// Key space using the configured prefix
    pub fn key_space(&self) -> KeySpace {
        KeySpace::new(self.key_prefix.clone())
    }

    /// Deadline for one operation starting now
    pub fn deadline(&self) -> Deadline {
        Deadline::from_timeout_ms(self.store_timeout_ms)
    }
}

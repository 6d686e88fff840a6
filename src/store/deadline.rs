//! Caller deadlines for store calls
//!
//! A `Deadline` travels with one request and is applied to every store call
//! made on its behalf. Expiry turns into `StoreError::Timeout`; there is no
//! partial result.

use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;

use super::errors::{StoreError, StoreResult};

/// Optional point in time after which store calls fail
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Deadline(Option<Instant>);

impl Deadline {
    /// No deadline: calls wait as long as the store does
    pub fn none() -> Self {
        Self(None)
    }

    /// Deadline at a fixed instant
    pub fn at(instant: Instant) -> Self {
        Self(Some(instant))
    }

    /// Deadline `timeout` from now
    pub fn after(timeout: Duration) -> Self {
        Self(Some(Instant::now() + timeout))
    }

    /// Deadline derived from an optional millisecond budget
    pub fn from_timeout_ms(timeout_ms: Option<u64>) -> Self {
        match timeout_ms {
            Some(ms) => Self::after(Duration::from_millis(ms)),
            None => Self::none(),
        }
    }

    /// Returns the instant, if set
    pub fn instant(&self) -> Option<Instant> {
        self.0
    }

    /// Runs one store call under this deadline
    pub async fn run<T, F>(self, operation: &str, call: F) -> StoreResult<T>
    where
        F: Future<Output = StoreResult<T>>,
    {
        match self.0 {
            None => call.await,
            Some(at) => match tokio::time::timeout_at(at, call).await {
                Ok(result) => result,
                Err(_) => Err(StoreError::timeout(operation)),
            },
        }
    }
}

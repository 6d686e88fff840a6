//! The key-value service seam
//!
//! `KvStore` is the narrow set of primitives the index engine needs from the
//! remote data-structure service. Methods return boxed futures so the trait
//! stays object-safe and any network client can sit behind it.

use std::collections::HashSet;
use std::future::Future;
use std::pin::Pin;

use super::errors::{StoreError, StoreResult};
use super::range::ScoreRange;

/// Future returned by every store primitive
pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = StoreResult<T>> + Send + 'a>>;

/// A single mutating store command, used to build atomic batches
#[derive(Debug, Clone, PartialEq)]
pub enum StoreOp {
    /// Add a member to a set
    SetAdd { key: String, member: String },
    /// Remove a member from a set
    SetRemove { key: String, member: String },
    /// Add or rescore a sorted-set member
    SortedAdd { key: String, member: String, score: f64 },
    /// Remove a sorted-set member
    SortedRemove { key: String, member: String },
    /// Store a plain value
    Put { key: String, value: String },
    /// Delete a key of any type
    Delete { key: String },
}

impl StoreOp {
    /// Returns the key this command touches
    pub fn key(&self) -> &str {
        match self {
            StoreOp::SetAdd { key, .. }
            | StoreOp::SetRemove { key, .. }
            | StoreOp::SortedAdd { key, .. }
            | StoreOp::SortedRemove { key, .. }
            | StoreOp::Put { key, .. }
            | StoreOp::Delete { key } => key,
        }
    }

    /// Returns the command name for logs
    pub fn name(&self) -> &'static str {
        match self {
            StoreOp::SetAdd { .. } => "SADD",
            StoreOp::SetRemove { .. } => "SREM",
            StoreOp::SortedAdd { .. } => "ZADD",
            StoreOp::SortedRemove { .. } => "ZREM",
            StoreOp::Put { .. } => "SET",
            StoreOp::Delete { .. } => "DEL",
        }
    }
}

/// Primitives of the remote key-value/data-structure service.
///
/// Each primitive must be atomic on its own. `apply_batch` is optional:
/// stores that cannot execute several commands atomically keep the default
/// `supports_atomic_batch() == false`.
pub trait KvStore: Send + Sync {
    /// Adds `member` to the set at `key`. Returns true if it was not present.
    fn sadd<'a>(&'a self, key: &'a str, member: &'a str) -> StoreFuture<'a, bool>;

    /// Removes `member` from the set at `key`. Returns true if it was present.
    fn srem<'a>(&'a self, key: &'a str, member: &'a str) -> StoreFuture<'a, bool>;

    /// Returns all members of the set at `key` (empty if missing).
    fn smembers<'a>(&'a self, key: &'a str) -> StoreFuture<'a, HashSet<String>>;

    /// Sets the score of `member` in the sorted set at `key`.
    /// Returns true if the member was new.
    fn zadd<'a>(&'a self, key: &'a str, member: &'a str, score: f64) -> StoreFuture<'a, bool>;

    /// Removes `member` from the sorted set at `key`.
    fn zrem<'a>(&'a self, key: &'a str, member: &'a str) -> StoreFuture<'a, bool>;

    /// Returns the score of `member`, if present.
    fn zscore<'a>(&'a self, key: &'a str, member: &'a str) -> StoreFuture<'a, Option<f64>>;

    /// Returns the members whose score lies in `range`, ordered by score.
    fn zrange_by_score<'a>(&'a self, key: &'a str, range: ScoreRange)
        -> StoreFuture<'a, Vec<String>>;

    /// Reads a plain value.
    fn get<'a>(&'a self, key: &'a str) -> StoreFuture<'a, Option<String>>;

    /// Writes a plain value.
    fn put<'a>(&'a self, key: &'a str, value: &'a str) -> StoreFuture<'a, ()>;

    /// Deletes a key of any type. Returns true if it existed.
    fn delete<'a>(&'a self, key: &'a str) -> StoreFuture<'a, bool>;

    /// Whether `apply_batch` executes all commands atomically.
    fn supports_atomic_batch(&self) -> bool {
        false
    }

    /// Executes all commands as one atomic unit.
    fn apply_batch(&self, ops: Vec<StoreOp>) -> StoreFuture<'_, ()> {
        let count = ops.len();
        Box::pin(async move {
            Err(StoreError::Unsupported(format!(
                "atomic batch of {} commands",
                count
            )))
        })
    }

    /// Executes a single command through the matching primitive.
    fn apply<'a>(&'a self, op: &'a StoreOp) -> StoreFuture<'a, ()> {
        Box::pin(async move {
            match op {
                StoreOp::SetAdd { key, member } => self.sadd(key, member).await.map(|_| ()),
                StoreOp::SetRemove { key, member } => self.srem(key, member).await.map(|_| ()),
                StoreOp::SortedAdd { key, member, score } => {
                    self.zadd(key, member, *score).await.map(|_| ())
                }
                StoreOp::SortedRemove { key, member } => self.zrem(key, member).await.map(|_| ()),
                StoreOp::Put { key, value } => self.put(key, value).await,
                StoreOp::Delete { key } => self.delete(key).await.map(|_| ()),
            }
        })
    }
}

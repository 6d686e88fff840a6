//! In-process `KvStore`
//!
//! Holds plain values, sets and sorted sets in memory behind one lock, so
//! every primitive and every batch is atomic exactly like a single-threaded
//! remote service. Fault injection and artificial latency let tests exercise
//! the failure paths of the index engine.

use std::cmp::Ordering as CmpOrdering;
use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;

use super::errors::{StoreError, StoreResult};
use super::range::{ScoreBound, ScoreRange};
use super::traits::{KvStore, StoreFuture, StoreOp};

/// Score wrapper with a total order
#[derive(Debug, Clone, Copy)]
struct Score(f64);

impl PartialEq for Score {
    fn eq(&self, other: &Self) -> bool {
        self.0.total_cmp(&other.0) == CmpOrdering::Equal
    }
}

impl Eq for Score {}

impl PartialOrd for Score {
    fn partial_cmp(&self, other: &Self) -> Option<CmpOrdering> {
        Some(self.cmp(other))
    }
}

impl Ord for Score {
    fn cmp(&self, other: &Self) -> CmpOrdering {
        self.0.total_cmp(&other.0)
    }
}

/// Sorted set: member -> score, iterable in (score, member) order
#[derive(Debug, Default, Clone)]
struct SortedSet {
    scores: HashMap<String, f64>,
    ordered: BTreeSet<(Score, String)>,
}

impl SortedSet {
    fn insert(&mut self, member: &str, score: f64) -> bool {
        let previous = self.scores.insert(member.to_string(), score);
        if let Some(old) = previous {
            self.ordered.remove(&(Score(old), member.to_string()));
        }
        self.ordered.insert((Score(score), member.to_string()));
        previous.is_none()
    }

    fn remove(&mut self, member: &str) -> bool {
        match self.scores.remove(member) {
            Some(old) => {
                self.ordered.remove(&(Score(old), member.to_string()));
                true
            }
            None => false,
        }
    }

    fn score(&self, member: &str) -> Option<f64> {
        self.scores.get(member).copied()
    }

    fn range(&self, range: &ScoreRange) -> Vec<String> {
        let start = match range.min {
            ScoreBound::Unbounded => Score(f64::NEG_INFINITY),
            ScoreBound::Inclusive(v) | ScoreBound::Exclusive(v) => Score(v),
        };

        self.ordered
            .range((start, String::new())..)
            .take_while(|(score, _)| !range.is_above_max(score.0))
            .filter(|(score, _)| range.contains(score.0))
            .map(|(_, member)| member.clone())
            .collect()
    }

    fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }
}

#[derive(Debug, Default)]
struct Data {
    values: HashMap<String, String>,
    sets: HashMap<String, HashSet<String>>,
    sorted: HashMap<String, SortedSet>,
}

impl Data {
    fn check_kind(&self, key: &str, kind: KeyKind) -> StoreResult<()> {
        let clash = match kind {
            KeyKind::Value => self.sets.contains_key(key) || self.sorted.contains_key(key),
            KeyKind::Set => self.values.contains_key(key) || self.sorted.contains_key(key),
            KeyKind::Sorted => self.values.contains_key(key) || self.sets.contains_key(key),
        };
        if clash {
            return Err(StoreError::WrongType(key.to_string()));
        }
        Ok(())
    }

    fn check(&self, op: &StoreOp) -> StoreResult<()> {
        match op {
            StoreOp::SetAdd { key, .. } | StoreOp::SetRemove { key, .. } => {
                self.check_kind(key, KeyKind::Set)
            }
            StoreOp::SortedAdd { key, .. } | StoreOp::SortedRemove { key, .. } => {
                self.check_kind(key, KeyKind::Sorted)
            }
            StoreOp::Put { key, .. } => self.check_kind(key, KeyKind::Value),
            StoreOp::Delete { .. } => Ok(()),
        }
    }

    fn sadd(&mut self, key: &str, member: &str) -> bool {
        self.sets
            .entry(key.to_string())
            .or_default()
            .insert(member.to_string())
    }

    fn srem(&mut self, key: &str, member: &str) -> bool {
        let Some(set) = self.sets.get_mut(key) else {
            return false;
        };
        let removed = set.remove(member);
        if set.is_empty() {
            self.sets.remove(key);
        }
        removed
    }

    fn zadd(&mut self, key: &str, member: &str, score: f64) -> bool {
        self.sorted
            .entry(key.to_string())
            .or_default()
            .insert(member, score)
    }

    fn zrem(&mut self, key: &str, member: &str) -> bool {
        let Some(zset) = self.sorted.get_mut(key) else {
            return false;
        };
        let removed = zset.remove(member);
        if zset.is_empty() {
            self.sorted.remove(key);
        }
        removed
    }

    fn delete(&mut self, key: &str) -> bool {
        self.values.remove(key).is_some()
            | self.sets.remove(key).is_some()
            | self.sorted.remove(key).is_some()
    }

    fn apply(&mut self, op: &StoreOp) {
        match op {
            StoreOp::SetAdd { key, member } => {
                self.sadd(key, member);
            }
            StoreOp::SetRemove { key, member } => {
                self.srem(key, member);
            }
            StoreOp::SortedAdd { key, member, score } => {
                self.zadd(key, member, *score);
            }
            StoreOp::SortedRemove { key, member } => {
                self.zrem(key, member);
            }
            StoreOp::Put { key, value } => {
                self.values.insert(key.clone(), value.clone());
            }
            StoreOp::Delete { key } => {
                self.delete(key);
            }
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum KeyKind {
    Value,
    Set,
    Sorted,
}

/// In-memory key-value store with sets and sorted sets
#[derive(Debug)]
pub struct MemoryStore {
    data: RwLock<Data>,
    atomic_batches: bool,
    latency: Option<Duration>,
    unavailable: AtomicBool,
    /// Remaining mutating commands before writes start failing
    write_budget: AtomicU64,
    budget_enabled: AtomicBool,
    mutations: AtomicU64,
    in_flight: AtomicU64,
    peak_in_flight: AtomicU64,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    /// Creates an empty store that supports atomic batches
    pub fn new() -> Self {
        Self {
            data: RwLock::new(Data::default()),
            atomic_batches: true,
            latency: None,
            unavailable: AtomicBool::new(false),
            write_budget: AtomicU64::new(0),
            budget_enabled: AtomicBool::new(false),
            mutations: AtomicU64::new(0),
            in_flight: AtomicU64::new(0),
            peak_in_flight: AtomicU64::new(0),
        }
    }

    /// Creates a store without the atomic batch primitive
    pub fn without_batches() -> Self {
        Self {
            atomic_batches: false,
            ..Self::new()
        }
    }

    /// Delays every call by `latency`
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Makes every call fail with `StoreError::Unavailable` (or heals it)
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Allows `commands` more mutating commands, then fails all writes.
    /// A batch counts as one command.
    pub fn fail_writes_after(&self, commands: u64) {
        self.write_budget.store(commands, Ordering::SeqCst);
        self.budget_enabled.store(true, Ordering::SeqCst);
    }

    /// Clears all injected faults
    pub fn heal(&self) {
        self.unavailable.store(false, Ordering::SeqCst);
        self.budget_enabled.store(false, Ordering::SeqCst);
    }

    /// Number of mutating primitives applied so far (batch members counted
    /// one by one)
    pub fn mutation_count(&self) -> u64 {
        self.mutations.load(Ordering::SeqCst)
    }

    /// Largest number of calls that were waiting on the store at once
    pub fn peak_in_flight(&self) -> u64 {
        self.peak_in_flight.load(Ordering::SeqCst)
    }

    /// Returns true if nothing is stored under `key`
    pub fn is_absent(&self, key: &str) -> bool {
        match self.data.read() {
            Ok(data) => {
                !data.values.contains_key(key)
                    && !data.sets.contains_key(key)
                    && !data.sorted.contains_key(key)
            }
            Err(_) => false,
        }
    }

    /// Returns every key currently stored, sorted
    pub fn keys(&self) -> Vec<String> {
        let Ok(data) = self.data.read() else {
            return Vec::new();
        };
        let mut keys: Vec<String> = data
            .values
            .keys()
            .chain(data.sets.keys())
            .chain(data.sorted.keys())
            .cloned()
            .collect();
        keys.sort();
        keys
    }

    async fn enter(&self, mutating: bool) -> StoreResult<()> {
        {
            let _call = InFlight::start(self);
            if let Some(latency) = self.latency {
                tokio::time::sleep(latency).await;
            }
        }
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StoreError::unavailable("connection refused"));
        }
        if mutating && self.budget_enabled.load(Ordering::SeqCst) {
            let spent = self
                .write_budget
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| left.checked_sub(1));
            if spent.is_err() {
                return Err(StoreError::unavailable("connection reset during write"));
            }
        }
        Ok(())
    }

    fn read(&self) -> StoreResult<RwLockReadGuard<'_, Data>> {
        self.data
            .read()
            .map_err(|_| StoreError::unavailable("memory store lock poisoned"))
    }

    fn write(&self) -> StoreResult<RwLockWriteGuard<'_, Data>> {
        self.data
            .write()
            .map_err(|_| StoreError::unavailable("memory store lock poisoned"))
    }

    fn count_mutations(&self, n: u64) {
        self.mutations.fetch_add(n, Ordering::SeqCst);
    }
}

/// Counts one call as in flight until dropped, including when a deadline
/// cancels the call mid-sleep
struct InFlight<'a> {
    counter: &'a AtomicU64,
}

impl<'a> InFlight<'a> {
    fn start(store: &'a MemoryStore) -> Self {
        let now = store.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        store.peak_in_flight.fetch_max(now, Ordering::SeqCst);
        Self {
            counter: &store.in_flight,
        }
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.counter.fetch_sub(1, Ordering::SeqCst);
    }
}

impl KvStore for MemoryStore {
    fn sadd<'a>(&'a self, key: &'a str, member: &'a str) -> StoreFuture<'a, bool> {
        Box::pin(async move {
            self.enter(true).await?;
            let mut data = self.write()?;
            data.check_kind(key, KeyKind::Set)?;
            self.count_mutations(1);
            Ok(data.sadd(key, member))
        })
    }

    fn srem<'a>(&'a self, key: &'a str, member: &'a str) -> StoreFuture<'a, bool> {
        Box::pin(async move {
            self.enter(true).await?;
            let mut data = self.write()?;
            data.check_kind(key, KeyKind::Set)?;
            self.count_mutations(1);
            Ok(data.srem(key, member))
        })
    }

    fn smembers<'a>(&'a self, key: &'a str) -> StoreFuture<'a, HashSet<String>> {
        Box::pin(async move {
            self.enter(false).await?;
            let data = self.read()?;
            data.check_kind(key, KeyKind::Set)?;
            Ok(data.sets.get(key).cloned().unwrap_or_default())
        })
    }

    fn zadd<'a>(&'a self, key: &'a str, member: &'a str, score: f64) -> StoreFuture<'a, bool> {
        Box::pin(async move {
            self.enter(true).await?;
            let mut data = self.write()?;
            data.check_kind(key, KeyKind::Sorted)?;
            self.count_mutations(1);
            Ok(data.zadd(key, member, score))
        })
    }

    fn zrem<'a>(&'a self, key: &'a str, member: &'a str) -> StoreFuture<'a, bool> {
        Box::pin(async move {
            self.enter(true).await?;
            let mut data = self.write()?;
            data.check_kind(key, KeyKind::Sorted)?;
            self.count_mutations(1);
            Ok(data.zrem(key, member))
        })
    }

    fn zscore<'a>(&'a self, key: &'a str, member: &'a str) -> StoreFuture<'a, Option<f64>> {
        Box::pin(async move {
            self.enter(false).await?;
            let data = self.read()?;
            data.check_kind(key, KeyKind::Sorted)?;
            Ok(data.sorted.get(key).and_then(|zset| zset.score(member)))
        })
    }

    fn zrange_by_score<'a>(
        &'a self,
        key: &'a str,
        range: ScoreRange,
    ) -> StoreFuture<'a, Vec<String>> {
        Box::pin(async move {
            self.enter(false).await?;
            let data = self.read()?;
            data.check_kind(key, KeyKind::Sorted)?;
            Ok(data
                .sorted
                .get(key)
                .map(|zset| zset.range(&range))
                .unwrap_or_default())
        })
    }

    fn get<'a>(&'a self, key: &'a str) -> StoreFuture<'a, Option<String>> {
        Box::pin(async move {
            self.enter(false).await?;
            let data = self.read()?;
            data.check_kind(key, KeyKind::Value)?;
            Ok(data.values.get(key).cloned())
        })
    }

    fn put<'a>(&'a self, key: &'a str, value: &'a str) -> StoreFuture<'a, ()> {
        Box::pin(async move {
            self.enter(true).await?;
            let mut data = self.write()?;
            data.check_kind(key, KeyKind::Value)?;
            self.count_mutations(1);
            data.values.insert(key.to_string(), value.to_string());
            Ok(())
        })
    }

    fn delete<'a>(&'a self, key: &'a str) -> StoreFuture<'a, bool> {
        Box::pin(async move {
            self.enter(true).await?;
            let mut data = self.write()?;
            self.count_mutations(1);
            Ok(data.delete(key))
        })
    }

    fn supports_atomic_batch(&self) -> bool {
        self.atomic_batches
    }

    fn apply_batch(&self, ops: Vec<StoreOp>) -> StoreFuture<'_, ()> {
        Box::pin(async move {
            if !self.atomic_batches {
                return Err(StoreError::Unsupported(format!(
                    "atomic batch of {} commands",
                    ops.len()
                )));
            }
            self.enter(true).await?;
            let mut data = self.write()?;
            // All-or-nothing: type errors abort before anything is applied
            for op in &ops {
                data.check(op)?;
            }
            for op in &ops {
                data.apply(op);
            }
            self.count_mutations(ops.len() as u64);
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_set_primitives() {
        let store = MemoryStore::new();
        assert!(store.sadd("s", "a").await.unwrap());
        assert!(!store.sadd("s", "a").await.unwrap());
        store.sadd("s", "b").await.unwrap();

        let members = store.smembers("s").await.unwrap();
        assert_eq!(members.len(), 2);

        assert!(store.srem("s", "a").await.unwrap());
        assert!(!store.srem("s", "a").await.unwrap());
        assert!(store.srem("s", "b").await.unwrap());

        // Empty sets disappear like they do on a remote service
        assert!(store.is_absent("s"));
        assert!(store.smembers("s").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_sorted_set_range_is_ordered_by_score() {
        let store = MemoryStore::new();
        store.zadd("z", "c", 300.0).await.unwrap();
        store.zadd("z", "a", 100.0).await.unwrap();
        store.zadd("z", "b", 200.0).await.unwrap();
        store.zadd("z", "d", 400.0).await.unwrap();

        let hits = store
            .zrange_by_score("z", ScoreRange::between(150.0, 350.0))
            .await
            .unwrap();
        assert_eq!(hits, vec!["b".to_string(), "c".to_string()]);

        let open = ScoreRange::new(ScoreBound::Exclusive(200.0), ScoreBound::Unbounded);
        let hits = store.zrange_by_score("z", open).await.unwrap();
        assert_eq!(hits, vec!["c".to_string(), "d".to_string()]);
    }

    #[tokio::test]
    async fn test_zadd_rescores_existing_member() {
        let store = MemoryStore::new();
        assert!(store.zadd("z", "a", 1.0).await.unwrap());
        assert!(!store.zadd("z", "a", 5.0).await.unwrap());

        assert_eq!(store.zscore("z", "a").await.unwrap(), Some(5.0));
        let low = store
            .zrange_by_score("z", ScoreRange::between(0.0, 2.0))
            .await
            .unwrap();
        assert!(low.is_empty());
    }

    #[tokio::test]
    async fn test_negative_scores_are_ranged() {
        let store = MemoryStore::new();
        store.zadd("z", "neg", -50.0).await.unwrap();
        store.zadd("z", "pos", 50.0).await.unwrap();

        let all = store.zrange_by_score("z", ScoreRange::all()).await.unwrap();
        assert_eq!(all, vec!["neg".to_string(), "pos".to_string()]);
    }

    #[tokio::test]
    async fn test_wrong_type_rejected() {
        let store = MemoryStore::new();
        store.put("k", "v").await.unwrap();
        let err = store.sadd("k", "m").await.unwrap_err();
        assert_eq!(err, StoreError::WrongType("k".into()));
    }

    #[tokio::test]
    async fn test_batch_is_all_or_nothing() {
        let store = MemoryStore::new();
        store.put("plain", "v").await.unwrap();

        let ops = vec![
            StoreOp::SetAdd {
                key: "s".into(),
                member: "a".into(),
            },
            StoreOp::SortedAdd {
                key: "plain".into(),
                member: "a".into(),
                score: 1.0,
            },
        ];
        assert!(store.apply_batch(ops).await.is_err());
        assert!(store.is_absent("s"));
    }

    #[tokio::test]
    async fn test_batch_unsupported_when_disabled() {
        let store = MemoryStore::without_batches();
        assert!(!store.supports_atomic_batch());
        let err = store.apply_batch(Vec::new()).await.unwrap_err();
        assert_eq!(err.code(), "KVIDX_STORE_UNSUPPORTED");
    }

    #[tokio::test]
    async fn test_write_budget_fails_later_writes_only() {
        let store = MemoryStore::new();
        store.fail_writes_after(1);

        store.sadd("s", "a").await.unwrap();
        let err = store.sadd("s", "b").await.unwrap_err();
        assert!(err.is_unavailable());

        // Reads still work
        assert_eq!(store.smembers("s").await.unwrap().len(), 1);

        store.heal();
        store.sadd("s", "b").await.unwrap();
        assert_eq!(store.mutation_count(), 2);
    }

    #[tokio::test]
    async fn test_unavailable_fails_everything() {
        let store = MemoryStore::new();
        store.set_unavailable(true);
        assert!(store.get("k").await.unwrap_err().is_unavailable());
        assert!(store.put("k", "v").await.unwrap_err().is_unavailable());
    }

    #[tokio::test]
    async fn test_apply_dispatches_single_op() {
        let store = MemoryStore::new();
        let op = StoreOp::Put {
            key: "k".into(),
            value: "v".into(),
        };
        store.apply(&op).await.unwrap();
        assert_eq!(store.get("k").await.unwrap(), Some("v".to_string()));
    }

    #[tokio::test]
    async fn test_peak_in_flight() {
        let store = MemoryStore::new().with_latency(Duration::from_millis(10));
        store.get("a").await.unwrap();
        assert_eq!(store.peak_in_flight(), 1);

        let (a, b, c) = tokio::join!(store.get("a"), store.get("b"), store.get("c"));
        assert!(a.is_ok() && b.is_ok() && c.is_ok());
        assert_eq!(store.peak_in_flight(), 3);
    }
}

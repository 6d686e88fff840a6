//! Query executor
//!
//! Execution flow:
//! 1. Unsatisfiable plan: empty result, no store call
//! 2. Empty plan: candidates are the collection membership set
//! 3. Otherwise run every lookup concurrently and intersect the id sets,
//!    smallest first, stopping as soon as the intersection is empty
//! 4. Fetch the surviving ids in id order, at most `fetch_concurrency` reads
//!    in flight; ids without a primary document are stale entries and are
//!    skipped, never reported as errors

use std::collections::HashSet;

use futures_util::future::try_join_all;
use futures_util::stream::{self, StreamExt, TryStreamExt};

use crate::document::Document;
use crate::observability::{Event, Observer};
use crate::planner::{Bounds, Lookup, LookupPlan};
use crate::store::{Deadline, KeySpace, KvStore};

use super::errors::{ExecutorError, ExecutorResult};
use super::result::QueryResult;

/// Default bound on concurrent document reads
pub const DEFAULT_FETCH_CONCURRENCY: usize = 32;

/// Query executor that resolves plans against the store
pub struct QueryExecutor<'a, S: KvStore + ?Sized> {
    store: &'a S,
    keys: &'a KeySpace,
    observer: &'a Observer,
    fetch_concurrency: usize,
}

impl<'a, S: KvStore + ?Sized> QueryExecutor<'a, S> {
    /// Creates a new executor
    pub fn new(store: &'a S, keys: &'a KeySpace, observer: &'a Observer) -> Self {
        Self {
            store,
            keys,
            observer,
            fetch_concurrency: DEFAULT_FETCH_CONCURRENCY,
        }
    }

    /// Bounds the document reads kept in flight (at least one)
    pub fn with_fetch_concurrency(mut self, limit: usize) -> Self {
        self.fetch_concurrency = limit.max(1);
        self
    }

    /// Resolves a plan to candidate ids, sorted.
    ///
    /// Candidates come from the indexes alone and may include stale ids.
    pub async fn candidates(&self, plan: &LookupPlan, deadline: Deadline) -> ExecutorResult<Vec<String>> {
        if plan.is_unsatisfiable() {
            return Ok(Vec::new());
        }

        if plan.is_full_collection() {
            let key = self.keys.membership(&plan.collection);
            let members = deadline
                .run("SMEMBERS", self.store.smembers(&key))
                .await
                .map_err(|e| ExecutorError::store_failed("SMEMBERS", e))?;
            return Ok(sorted(members));
        }

        let sets = try_join_all(
            plan.lookups
                .iter()
                .map(|lookup| self.lookup(&plan.collection, lookup, deadline)),
        )
        .await?;

        Ok(sorted(intersect(sets)))
    }

    /// Executes a plan and returns the live matching documents
    pub async fn execute(&self, plan: &LookupPlan, deadline: Deadline) -> ExecutorResult<QueryResult> {
        let ids = self.candidates(plan, deadline).await?;
        let candidate_count = ids.len();

        let fetched: Vec<Option<Document>> = stream::iter(
            ids.iter()
                .map(|id| self.fetch(&plan.collection, id, deadline)),
        )
        .buffered(self.fetch_concurrency)
        .try_collect()
        .await?;

        let mut documents = Vec::with_capacity(candidate_count);
        let mut stale_skipped = 0;
        for (id, doc) in ids.iter().zip(fetched) {
            match doc {
                Some(doc) => documents.push(doc),
                None => {
                    stale_skipped += 1;
                    self.observer.metrics().increment_stale_skipped();
                    self.observer.emit(
                        Event::StaleIndexEntrySkipped,
                        &[
                            ("collection", plan.collection.as_str()),
                            ("document_id", id.as_str()),
                        ],
                    );
                }
            }
        }

        let metrics = self.observer.metrics();
        metrics.increment_queries_executed();
        metrics.add_documents_fetched(documents.len() as u64);

        let lookups = plan.lookups.len().to_string();
        let candidates = candidate_count.to_string();
        let returned = documents.len().to_string();
        let stale = stale_skipped.to_string();
        self.observer.emit(
            Event::QueryExecuted,
            &[
                ("collection", plan.collection.as_str()),
                ("lookups", lookups.as_str()),
                ("candidates", candidates.as_str()),
                ("returned", returned.as_str()),
                ("stale_skipped", stale.as_str()),
            ],
        );

        Ok(QueryResult {
            documents,
            candidate_count,
            stale_skipped,
        })
    }

    async fn lookup(
        &self,
        collection: &str,
        lookup: &Lookup,
        deadline: Deadline,
    ) -> ExecutorResult<HashSet<String>> {
        match &lookup.bounds {
            Bounds::Exact(value) => {
                let key = self.keys.exact_bucket(collection, &lookup.field, value);
                deadline
                    .run("SMEMBERS", self.store.smembers(&key))
                    .await
                    .map_err(|e| ExecutorError::store_failed("SMEMBERS", e))
            }
            Bounds::Range(range) => {
                let key = self.keys.range_index(collection, &lookup.field);
                let ids = deadline
                    .run("ZRANGEBYSCORE", self.store.zrange_by_score(&key, *range))
                    .await
                    .map_err(|e| ExecutorError::store_failed("ZRANGEBYSCORE", e))?;
                Ok(ids.into_iter().collect())
            }
            Bounds::Empty => Ok(HashSet::new()),
        }
    }

    async fn fetch(
        &self,
        collection: &str,
        id: &str,
        deadline: Deadline,
    ) -> ExecutorResult<Option<Document>> {
        let key = self.keys.document(collection, id);
        let raw = deadline
            .run("GET", self.store.get(&key))
            .await
            .map_err(|e| ExecutorError::store_failed("GET", e))?;

        match raw {
            Some(raw) => Document::decode(&key, &raw)
                .map(Some)
                .map_err(|e| ExecutorError::store_failed("GET", e)),
            None => Ok(None),
        }
    }
}

/// Intersects id sets, smallest first
fn intersect(mut sets: Vec<HashSet<String>>) -> HashSet<String> {
    sets.sort_by_key(|s| s.len());
    let mut sets = sets.into_iter();
    let Some(mut acc) = sets.next() else {
        return HashSet::new();
    };
    for set in sets {
        if acc.is_empty() {
            break;
        }
        acc.retain(|id| set.contains(id));
    }
    acc
}

fn sorted(ids: HashSet<String>) -> Vec<String> {
    let mut ids: Vec<String> = ids.into_iter().collect();
    ids.sort();
    ids
}

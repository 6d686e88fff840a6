//! Index maintenance for document lifecycle events
//!
//! Maintenance runs in two phases:
//!
//! 1. Plan: every value is converted and the store commands for the event
//!    are collected. Unsupported values are rejected here, so a rejected
//!    event never touches the store.
//! 2. Apply: one atomic batch when the store offers it and batching is
//!    enabled, otherwise command by command, stopping at the first failure.
//!    Nothing is retried or rolled back.
//!
//! Insert adds the id to the collection membership set before any index
//! entry; delete removes it after every index entry is gone.

use std::fmt;
use std::future::Future;
use std::pin::Pin;

use serde_json::Value;

use crate::document::{non_null, Attributes, Document};
use crate::observability::{Event, Observer};
use crate::schema::{IndexDescriptor, IndexKind};
use crate::store::{Deadline, KeySpace, KvStore, StoreOp};

use super::errors::{IndexError, IndexResult};
use super::value::{json_type_name, IndexValue};

/// What a planned command maintains
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    /// The index of one field
    Field(String),
    /// The collection membership set
    Membership,
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Target::Field(name) => write!(f, "{}", name),
            Target::Membership => write!(f, "<membership>"),
        }
    }
}

/// One store command and the structure it maintains
#[derive(Debug, Clone, PartialEq)]
pub struct PlannedOp {
    pub target: Target,
    pub op: StoreOp,
}

/// Store commands for one document event, in execution order
#[derive(Debug, Clone, PartialEq)]
pub struct MaintenancePlan {
    document_id: String,
    steps: Vec<PlannedOp>,
}

impl MaintenancePlan {
    fn new(document_id: &str) -> Self {
        Self {
            document_id: document_id.to_string(),
            steps: Vec::new(),
        }
    }

    fn push(&mut self, target: Target, op: StoreOp) {
        self.steps.push(PlannedOp { target, op });
    }

    /// Identifier of the document the plan maintains
    pub fn document_id(&self) -> &str {
        &self.document_id
    }

    /// Planned commands
    pub fn steps(&self) -> &[PlannedOp] {
        &self.steps
    }

    /// Number of planned commands
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Returns true when the event needs no store write
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Distinct targets in first-touch order
    pub fn targets(&self) -> Vec<String> {
        distinct_targets(&self.steps)
    }

    fn into_ops(self) -> Vec<StoreOp> {
        self.steps.into_iter().map(|s| s.op).collect()
    }
}

fn distinct_targets(steps: &[PlannedOp]) -> Vec<String> {
    let mut targets: Vec<String> = Vec::new();
    for step in steps {
        let name = step.target.to_string();
        if !targets.contains(&name) {
            targets.push(name);
        }
    }
    targets
}

/// Outcome of a successful maintenance run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MaintenanceReport {
    /// Store commands applied
    pub commands: usize,
    /// True when the commands went out as one atomic batch
    pub atomic: bool,
    /// Structures touched
    pub targets: Vec<String>,
}

/// Future returned by the lifecycle hooks
pub type HookFuture<'a> = Pin<Box<dyn Future<Output = IndexResult<MaintenanceReport>> + Send + 'a>>;

/// Hooks a persistence layer calls around primary-storage writes
pub trait LifecycleHooks: Send + Sync {
    /// Called after the document has been written for the first time
    fn after_insert<'a>(&'a self, doc: &'a Document, deadline: Deadline) -> HookFuture<'a>;

    /// Called before the document is removed from primary storage
    fn before_delete<'a>(&'a self, doc: &'a Document, deadline: Deadline) -> HookFuture<'a>;

    /// Called after the document has been overwritten
    fn after_update<'a>(
        &'a self,
        doc: &'a Document,
        previous: &'a Attributes,
        deadline: Deadline,
    ) -> HookFuture<'a>;
}

/// Maintains the indexes of one collection
pub struct IndexMaintainer<'a, S: KvStore + ?Sized> {
    store: &'a S,
    keys: &'a KeySpace,
    collection: &'a str,
    descriptors: &'a [IndexDescriptor],
    observer: &'a Observer,
    use_batches: bool,
}

impl<'a, S: KvStore + ?Sized> IndexMaintainer<'a, S> {
    /// Creates a maintainer; batching is on by default
    pub fn new(
        store: &'a S,
        keys: &'a KeySpace,
        collection: &'a str,
        descriptors: &'a [IndexDescriptor],
        observer: &'a Observer,
    ) -> Self {
        Self {
            store,
            keys,
            collection,
            descriptors,
            observer,
            use_batches: true,
        }
    }

    /// Enables or disables the atomic batch primitive
    pub fn with_batches(mut self, use_batches: bool) -> Self {
        self.use_batches = use_batches;
        self
    }

    /// Whether the next apply goes out as one atomic batch
    pub fn is_atomic(&self) -> bool {
        self.use_batches && self.store.supports_atomic_batch()
    }

    fn check_document(&self, doc: &Document) -> IndexResult<()> {
        if doc.collection != self.collection {
            return Err(IndexError::collection_mismatch(
                self.collection,
                &doc.collection,
                &doc.id,
            ));
        }
        if KeySpace::is_reserved_id(&doc.id) {
            return Err(IndexError::reserved_document_id(
                self.collection,
                &doc.id,
                &self.keys.membership(self.collection),
            ));
        }
        Ok(())
    }

    /// Strict conversion for the value being written
    fn convert(
        &self,
        doc_id: &str,
        descriptor: &IndexDescriptor,
        value: &Value,
    ) -> IndexResult<IndexValue> {
        IndexValue::for_descriptor(descriptor, value).ok_or_else(|| {
            let expected = match descriptor.kind {
                IndexKind::Exact => "a scalar",
                IndexKind::Range => "a finite number",
            };
            IndexError::unsupported_value(
                self.collection,
                doc_id,
                &descriptor.field,
                format!(
                    "{} index expects {}, got {}",
                    descriptor.kind,
                    expected,
                    json_type_name(value)
                ),
            )
        })
    }

    fn add_op(&self, descriptor: &IndexDescriptor, doc_id: &str, value: IndexValue) -> StoreOp {
        match value {
            IndexValue::Bucket(bucket) => StoreOp::SetAdd {
                key: self.keys.exact_bucket(self.collection, &descriptor.field, &bucket),
                member: doc_id.to_string(),
            },
            IndexValue::Score(score) => StoreOp::SortedAdd {
                key: self.keys.range_index(self.collection, &descriptor.field),
                member: doc_id.to_string(),
                score,
            },
        }
    }

    fn remove_op(&self, descriptor: &IndexDescriptor, doc_id: &str, value: IndexValue) -> StoreOp {
        match value {
            IndexValue::Bucket(bucket) => StoreOp::SetRemove {
                key: self.keys.exact_bucket(self.collection, &descriptor.field, &bucket),
                member: doc_id.to_string(),
            },
            IndexValue::Score(_) => StoreOp::SortedRemove {
                key: self.keys.range_index(self.collection, &descriptor.field),
                member: doc_id.to_string(),
            },
        }
    }

    /// Commands indexing a newly written document
    pub fn plan_insert(&self, doc: &Document) -> IndexResult<MaintenancePlan> {
        self.check_document(doc)?;
        let mut plan = MaintenancePlan::new(&doc.id);

        plan.push(
            Target::Membership,
            StoreOp::SetAdd {
                key: self.keys.membership(self.collection),
                member: doc.id.clone(),
            },
        );

        for descriptor in self.descriptors {
            if let Some(value) = doc.value(&descriptor.field) {
                let converted = self.convert(&doc.id, descriptor, value)?;
                plan.push(
                    Target::Field(descriptor.field.clone()),
                    self.add_op(descriptor, &doc.id, converted),
                );
            }
        }

        Ok(plan)
    }

    /// Commands removing every entry the document holds.
    ///
    /// Values that could never have been indexed are skipped.
    pub fn plan_delete(&self, doc: &Document) -> IndexResult<MaintenancePlan> {
        self.check_document(doc)?;
        let mut plan = MaintenancePlan::new(&doc.id);

        for descriptor in self.descriptors {
            let previous = doc
                .value(&descriptor.field)
                .and_then(|v| IndexValue::for_descriptor(descriptor, v));
            if let Some(previous) = previous {
                plan.push(
                    Target::Field(descriptor.field.clone()),
                    self.remove_op(descriptor, &doc.id, previous),
                );
            }
        }

        plan.push(
            Target::Membership,
            StoreOp::SetRemove {
                key: self.keys.membership(self.collection),
                member: doc.id.clone(),
            },
        );

        Ok(plan)
    }

    /// Commands moving the entries of changed fields.
    ///
    /// `previous` holds the attribute values before the update; a field
    /// missing from it counts as previously null. Values are compared in
    /// their index encoding.
    pub fn plan_update(&self, doc: &Document, previous: &Attributes) -> IndexResult<MaintenancePlan> {
        self.check_document(doc)?;
        let mut plan = MaintenancePlan::new(&doc.id);

        for descriptor in self.descriptors {
            let new = match doc.value(&descriptor.field) {
                Some(value) => Some(self.convert(&doc.id, descriptor, value)?),
                None => None,
            };
            let old = non_null(previous, &descriptor.field)
                .and_then(|v| IndexValue::for_descriptor(descriptor, v));

            if old == new {
                continue;
            }

            let target = Target::Field(descriptor.field.clone());
            match (descriptor.kind, old, new) {
                // ZADD rescores in place
                (IndexKind::Range, _, Some(new)) => {
                    plan.push(target, self.add_op(descriptor, &doc.id, new));
                }
                (_, old, new) => {
                    if let Some(old) = old {
                        plan.push(target.clone(), self.remove_op(descriptor, &doc.id, old));
                    }
                    if let Some(new) = new {
                        plan.push(target, self.add_op(descriptor, &doc.id, new));
                    }
                }
            }
        }

        Ok(plan)
    }

    /// Sends a plan to the store
    pub async fn apply(
        &self,
        plan: MaintenancePlan,
        deadline: Deadline,
    ) -> IndexResult<MaintenanceReport> {
        let targets = plan.targets();
        let commands = plan.len();

        if plan.is_empty() {
            return Ok(MaintenanceReport {
                commands: 0,
                atomic: false,
                targets,
            });
        }

        if self.is_atomic() {
            let document_id = plan.document_id.clone();
            let ops = plan.into_ops();
            if let Err(source) = deadline
                .run("apply_batch", self.store.apply_batch(ops))
                .await
            {
                return Err(self.fail(&document_id, Vec::new(), targets, source));
            }
            self.observer.metrics().add_index_writes(commands as u64);
            return Ok(MaintenanceReport {
                commands,
                atomic: true,
                targets,
            });
        }

        for (i, step) in plan.steps.iter().enumerate() {
            if let Err(source) = deadline.run(step.op.name(), self.store.apply(&step.op)).await {
                self.observer.metrics().add_index_writes(i as u64);
                let pending = distinct_targets(&plan.steps[i..]);
                let applied = distinct_targets(&plan.steps[..i])
                    .into_iter()
                    .filter(|t| !pending.contains(t))
                    .collect();
                return Err(self.fail(&plan.document_id, applied, pending, source));
            }
        }

        self.observer.metrics().add_index_writes(commands as u64);
        Ok(MaintenanceReport {
            commands,
            atomic: false,
            targets,
        })
    }

    fn fail(
        &self,
        document_id: &str,
        applied: Vec<String>,
        pending: Vec<String>,
        source: crate::store::StoreError,
    ) -> IndexError {
        let err = IndexError::maintenance_failed(
            self.collection,
            document_id,
            applied,
            pending,
            source,
        );
        self.observer.metrics().increment_maintenance_failures();
        let applied = err.applied().join(",");
        let pending = err.pending().join(",");
        let reason = err.store_error().map(|e| e.to_string()).unwrap_or_default();
        self.observer.emit(
            Event::IndexMaintenanceFailed,
            &[
                ("collection", self.collection),
                ("document_id", document_id),
                ("applied", applied.as_str()),
                ("pending", pending.as_str()),
                ("reason", reason.as_str()),
            ],
        );
        err
    }

    /// Indexes a newly inserted document
    pub async fn on_insert(&self, doc: &Document, deadline: Deadline) -> IndexResult<MaintenanceReport> {
        let plan = self.plan_insert(doc)?;
        self.apply(plan, deadline).await
    }

    /// Removes a document from every index
    pub async fn on_delete(&self, doc: &Document, deadline: Deadline) -> IndexResult<MaintenanceReport> {
        let plan = self.plan_delete(doc)?;
        self.apply(plan, deadline).await
    }

    /// Reconciles the indexes of an updated document
    pub async fn on_update(
        &self,
        doc: &Document,
        previous: &Attributes,
        deadline: Deadline,
    ) -> IndexResult<MaintenanceReport> {
        let plan = self.plan_update(doc, previous)?;
        self.apply(plan, deadline).await
    }
}

impl<'a, S: KvStore + ?Sized> LifecycleHooks for IndexMaintainer<'a, S> {
    fn after_insert<'b>(&'b self, doc: &'b Document, deadline: Deadline) -> HookFuture<'b> {
        Box::pin(self.on_insert(doc, deadline))
    }

    fn before_delete<'b>(&'b self, doc: &'b Document, deadline: Deadline) -> HookFuture<'b> {
        Box::pin(self.on_delete(doc, deadline))
    }

    fn after_update<'b>(
        &'b self,
        doc: &'b Document,
        previous: &'b Attributes,
        deadline: Deadline,
    ) -> HookFuture<'b> {
        Box::pin(self.on_update(doc, previous, deadline))
    }
}

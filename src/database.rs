//! Database facade
//!
//! Owns primary-storage writes and runs index maintenance around them:
//!
//! - insert/update: validate index values, write the document, then index it
//! - delete: remove index entries, then the document
//! - find: plan, then execute
//!
//! Every public operation derives one `Deadline` from the configuration;
//! the `*_with_deadline` variants take it from the caller.

use std::sync::Arc;

use crate::config::IndexConfig;
use crate::document::{Attributes, Document};
use crate::errors::{Error, Result};
use crate::executor::{QueryExecutor, QueryResult};
use crate::index::{IndexMaintainer, LifecycleHooks, MaintenanceReport};
use crate::observability::{Event, IndexMetrics, Observer};
use crate::planner::{ExplainPlan, Filter, LookupPlan, PlannerError, QueryPlanner};
use crate::schema::{Descriptors, DocumentModel, IndexDescriptor, SchemaRegistry};
use crate::store::{Deadline, KeySpace, KvStore};

/// Documents of registered collections, indexed in a key-value store
pub struct Database<S: KvStore + ?Sized> {
    store: Arc<S>,
    registry: SchemaRegistry,
    keys: KeySpace,
    config: IndexConfig,
    observer: Observer,
}

impl<S: KvStore + ?Sized> Database<S> {
    /// Opens a database with the default configuration
    pub fn new(store: Arc<S>) -> Self {
        let config = IndexConfig::default();
        Self {
            store,
            registry: SchemaRegistry::new(),
            keys: config.key_space(),
            observer: Observer::new(Arc::new(IndexMetrics::new()), config.log_events),
            config,
        }
    }

    /// Opens a database with a validated configuration
    pub fn with_config(store: Arc<S>, config: IndexConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            store,
            registry: SchemaRegistry::new(),
            keys: config.key_space(),
            observer: Observer::new(Arc::new(IndexMetrics::new()), config.log_events),
            config,
        })
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn config(&self) -> &IndexConfig {
        &self.config
    }

    pub fn keys(&self) -> &KeySpace {
        &self.keys
    }

    pub fn registry(&self) -> &SchemaRegistry {
        &self.registry
    }

    pub fn metrics(&self) -> &IndexMetrics {
        self.observer.metrics()
    }

    fn maintainer<'a>(
        &'a self,
        collection: &'a str,
        descriptors: &'a [IndexDescriptor],
    ) -> IndexMaintainer<'a, S> {
        IndexMaintainer::new(&*self.store, &self.keys, collection, descriptors, &self.observer)
            .with_batches(self.config.atomic_batches)
    }

    fn executor(&self) -> QueryExecutor<'_, S> {
        QueryExecutor::new(&*self.store, &self.keys, &self.observer)
            .with_fetch_concurrency(self.config.fetch_concurrency)
    }

    /// Registers a document model; idempotent for an identical model
    pub fn register(&self, model: &DocumentModel) -> Result<Descriptors> {
        let descriptors = self.registry.register(model)?;
        let indexed = descriptors.len().to_string();
        self.observer.emit(
            Event::SchemaRegistered,
            &[
                ("collection", model.collection.as_str()),
                ("indexed_fields", indexed.as_str()),
            ],
        );
        Ok(descriptors)
    }

    async fn read(&self, collection: &str, id: &str, deadline: Deadline) -> Result<Option<Document>> {
        // the reserved id addresses the membership set, never a document
        if KeySpace::is_reserved_id(id) {
            return Ok(None);
        }
        let key = self.keys.document(collection, id);
        match deadline.run("GET", self.store.get(&key)).await? {
            Some(raw) => Ok(Some(Document::decode(&key, &raw)?)),
            None => Ok(None),
        }
    }

    async fn write(&self, doc: &Document, deadline: Deadline) -> Result<()> {
        let key = self.keys.document(&doc.collection, &doc.id);
        let raw = doc.encode()?;
        deadline.run("SET", self.store.put(&key, &raw)).await?;
        Ok(())
    }

    fn report(&self, event: Event, doc: &Document, report: &MaintenanceReport) {
        let commands = report.commands.to_string();
        let atomic = report.atomic.to_string();
        self.observer.emit(
            event,
            &[
                ("collection", doc.collection.as_str()),
                ("document_id", doc.id.as_str()),
                ("index_commands", commands.as_str()),
                ("atomic", atomic.as_str()),
            ],
        );
    }

    /// Stores a new document and indexes it
    pub async fn insert(&self, doc: &Document) -> Result<MaintenanceReport> {
        self.insert_with_deadline(doc, self.config.deadline()).await
    }

    pub async fn insert_with_deadline(
        &self,
        doc: &Document,
        deadline: Deadline,
    ) -> Result<MaintenanceReport> {
        let descriptors = self.registry.descriptors(&doc.collection)?;
        let maintainer = self.maintainer(&doc.collection, &descriptors);
        maintainer.plan_insert(doc)?;

        if self.read(&doc.collection, &doc.id, deadline).await?.is_some() {
            return Err(Error::DocumentExists {
                collection: doc.collection.clone(),
                id: doc.id.clone(),
            });
        }
        self.write(doc, deadline).await?;

        let report = maintainer.after_insert(doc, deadline).await?;
        self.report(Event::DocumentInserted, doc, &report);
        Ok(report)
    }

    /// Reads a document by id
    pub async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>> {
        self.get_with_deadline(collection, id, self.config.deadline()).await
    }

    pub async fn get_with_deadline(
        &self,
        collection: &str,
        id: &str,
        deadline: Deadline,
    ) -> Result<Option<Document>> {
        self.registry.descriptors(collection)?;
        self.read(collection, id, deadline).await
    }

    /// Overwrites an existing document, moving the entries of changed fields.
    ///
    /// The previous values are read from primary storage.
    pub async fn update(&self, doc: &Document) -> Result<MaintenanceReport> {
        self.update_with_deadline(doc, self.config.deadline()).await
    }

    pub async fn update_with_deadline(
        &self,
        doc: &Document,
        deadline: Deadline,
    ) -> Result<MaintenanceReport> {
        self.registry.descriptors(&doc.collection)?;
        let previous = self
            .read(&doc.collection, &doc.id, deadline)
            .await?
            .ok_or_else(|| not_found(doc))?;
        self.overwrite(doc, &previous.attributes, deadline).await
    }

    /// Overwrites a stored document whose previous attribute values the
    /// caller already knows. Fields missing from `previous` count as null.
    pub async fn update_from(
        &self,
        doc: &Document,
        previous: &Attributes,
        deadline: Deadline,
    ) -> Result<MaintenanceReport> {
        self.registry.descriptors(&doc.collection)?;
        if self.read(&doc.collection, &doc.id, deadline).await?.is_none() {
            return Err(not_found(doc));
        }
        self.overwrite(doc, previous, deadline).await
    }

    async fn overwrite(
        &self,
        doc: &Document,
        previous: &Attributes,
        deadline: Deadline,
    ) -> Result<MaintenanceReport> {
        let descriptors = self.registry.descriptors(&doc.collection)?;
        let maintainer = self.maintainer(&doc.collection, &descriptors);
        maintainer.plan_update(doc, previous)?;

        self.write(doc, deadline).await?;

        let report = maintainer.after_update(doc, previous, deadline).await?;
        self.report(Event::DocumentUpdated, doc, &report);
        Ok(report)
    }

    /// Inserts or updates, depending on whether the id is stored
    pub async fn save(&self, doc: &Document) -> Result<MaintenanceReport> {
        let deadline = self.config.deadline();
        match self.read(&doc.collection, &doc.id, deadline).await? {
            Some(previous) => self.overwrite(doc, &previous.attributes, deadline).await,
            None => self.insert_with_deadline(doc, deadline).await,
        }
    }

    /// Deletes a document and every index entry it holds.
    ///
    /// Returns false if the document does not exist. When index cleanup
    /// fails the document is still deleted; leftover entries are stale and
    /// skipped by queries.
    pub async fn delete(&self, collection: &str, id: &str) -> Result<bool> {
        self.delete_with_deadline(collection, id, self.config.deadline()).await
    }

    pub async fn delete_with_deadline(
        &self,
        collection: &str,
        id: &str,
        deadline: Deadline,
    ) -> Result<bool> {
        let descriptors = self.registry.descriptors(collection)?;
        let Some(stored) = self.read(collection, id, deadline).await? else {
            return Ok(false);
        };

        let maintainer = self.maintainer(collection, &descriptors);
        let cleanup = maintainer.before_delete(&stored, deadline).await;

        let key = self.keys.document(collection, id);
        let removed = deadline.run("DEL", self.store.delete(&key)).await;

        let report = cleanup?;
        let removed = removed?;
        self.report(Event::DocumentDeleted, &stored, &report);
        Ok(removed)
    }

    /// Plans a filter against the collection's indexes
    pub fn plan(&self, collection: &str, filter: &Filter) -> Result<LookupPlan> {
        let planned = match self.registry.descriptors(collection) {
            Ok(descriptors) => QueryPlanner::new(collection, &descriptors).plan(filter),
            Err(_) => Err(PlannerError::unknown_collection(collection)),
        };

        match planned {
            Ok(plan) => {
                let lookups = plan.lookups.len().to_string();
                self.observer.emit(
                    Event::QueryPlanned,
                    &[("collection", collection), ("lookups", lookups.as_str())],
                );
                Ok(plan)
            }
            Err(err) => {
                self.observer.metrics().increment_queries_rejected();
                self.observer.emit(
                    Event::QueryRejected,
                    &[
                        ("collection", collection),
                        ("code", err.code().code()),
                        ("reason", err.message()),
                    ],
                );
                Err(err.into())
            }
        }
    }

    /// Returns the live documents matching every predicate of the filter.
    ///
    /// The empty filter returns every document of the collection.
    pub async fn find(&self, collection: &str, filter: &Filter) -> Result<QueryResult> {
        self.find_with_deadline(collection, filter, self.config.deadline())
            .await
    }

    pub async fn find_with_deadline(
        &self,
        collection: &str,
        filter: &Filter,
        deadline: Deadline,
    ) -> Result<QueryResult> {
        let plan = self.plan(collection, filter)?;
        Ok(self.executor().execute(&plan, deadline).await?)
    }

    /// Returns the ids the indexes hold for the filter, sorted, without
    /// reading the documents. Stale ids are not filtered out.
    pub async fn find_ids(&self, collection: &str, filter: &Filter) -> Result<Vec<String>> {
        let plan = self.plan(collection, filter)?;
        Ok(self
            .executor()
            .candidates(&plan, self.config.deadline())
            .await?)
    }

    /// Explains how a filter would be resolved, or why it is rejected
    pub fn explain(&self, collection: &str, filter: &Filter) -> ExplainPlan {
        let descriptors = match self.registry.descriptors(collection) {
            Ok(descriptors) => descriptors,
            Err(_) => {
                return ExplainPlan::from_error(
                    collection,
                    &PlannerError::unknown_collection(collection),
                )
            }
        };
        match QueryPlanner::new(collection, &descriptors).plan(filter) {
            Ok(plan) => ExplainPlan::from_plan(&plan),
            Err(err) => ExplainPlan::from_error(collection, &err),
        }
    }
}

fn not_found(doc: &Document) -> Error {
    Error::DocumentNotFound {
        collection: doc.collection.clone(),
        id: doc.id.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::FieldDef;
    use crate::store::MemoryStore;

    fn model() -> DocumentModel {
        DocumentModel::new("Product")
            .field("category", FieldDef::string().indexed())
            .field("price", FieldDef::float().indexed())
    }

    fn database() -> Database<MemoryStore> {
        let db = Database::with_config(Arc::new(MemoryStore::new()), IndexConfig::default().quiet())
            .unwrap();
        db.register(&model()).unwrap();
        db
    }

    #[tokio::test]
    async fn test_insert_get_delete() {
        let db = database();
        let doc = Document::with_id("Product", "p1")
            .set("category", "books")
            .set("price", 10.0);

        db.insert(&doc).await.unwrap();
        assert_eq!(db.get("Product", "p1").await.unwrap(), Some(doc.clone()));

        assert!(db.delete("Product", "p1").await.unwrap());
        assert!(!db.delete("Product", "p1").await.unwrap());
        assert!(db.store().keys().is_empty());
    }

    #[tokio::test]
    async fn test_duplicate_insert_rejected() {
        let db = database();
        let doc = Document::with_id("Product", "p1").set("category", "books");
        db.insert(&doc).await.unwrap();

        let err = db.insert(&doc).await.unwrap_err();
        assert_eq!(err.code(), "KVIDX_DOCUMENT_EXISTS");
    }

    #[tokio::test]
    async fn test_update_missing_document() {
        let db = database();
        let err = db
            .update(&Document::with_id("Product", "nope"))
            .await
            .unwrap_err();
        assert_eq!(err.code(), "KVIDX_DOCUMENT_NOT_FOUND");

        let doc = Document::with_id("Product", "p9").set("category", "books");
        let err = db
            .update_from(&doc, &Attributes::new(), Deadline::none())
            .await
            .unwrap_err();
        assert_eq!(err.code(), "KVIDX_DOCUMENT_NOT_FOUND");
        assert!(db.store().keys().is_empty());
    }

    #[tokio::test]
    async fn test_reserved_id() {
        let db = database();
        let doc = Document::with_id("Product", "all").set("category", "books");

        let err = db.insert(&doc).await.unwrap_err();
        assert_eq!(err.code(), "KVIDX_RESERVED_DOCUMENT_ID");
        assert_eq!(db.save(&doc).await.unwrap_err().code(), "KVIDX_RESERVED_DOCUMENT_ID");
        assert!(db.store().keys().is_empty());

        db.insert(&Document::with_id("Product", "p1")).await.unwrap();
        assert_eq!(db.get("Product", "all").await.unwrap(), None);
        assert!(!db.delete("Product", "all").await.unwrap());
        assert_eq!(db.update(&doc).await.unwrap_err().code(), "KVIDX_DOCUMENT_NOT_FOUND");
    }

    #[tokio::test]
    async fn test_save_upserts() {
        let db = database();
        let doc = Document::with_id("Product", "p1").set("category", "books");
        db.save(&doc).await.unwrap();
        db.save(&doc.clone().set("category", "games")).await.unwrap();

        let ids = db
            .find_ids("Product", &Filter::new().eq("category", "games"))
            .await
            .unwrap();
        assert_eq!(ids, vec!["p1".to_string()]);
    }

    #[tokio::test]
    async fn test_unknown_collection() {
        let db = database();
        let err = db.find("Order", &Filter::new()).await.unwrap_err();
        assert_eq!(err.code(), "KVIDX_UNKNOWN_COLLECTION");
        assert_eq!(db.metrics().snapshot().queries_rejected, 1);

        let err = db
            .insert(&Document::with_id("Order", "o1"))
            .await
            .unwrap_err();
        assert_eq!(err.code(), "KVIDX_UNKNOWN_COLLECTION");
        assert!(!db.explain("Order", &Filter::new()).accepted);
    }
}

//! Schema registry
//!
//! Turns each registered `DocumentModel` into its ordered list of
//! `IndexDescriptor`s, once. Descriptors never change afterwards:
//! registering the same model again returns the existing list, registering
//! a different model under the same collection is rejected.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use super::descriptor::{IndexDescriptor, IndexKind};
use super::errors::{SchemaError, SchemaResult};
use super::types::DocumentModel;

/// Descriptor list shared with planners and maintainers
pub type Descriptors = Arc<Vec<IndexDescriptor>>;

#[derive(Debug)]
struct Registered {
    model: DocumentModel,
    descriptors: Descriptors,
}

/// Registry of document models and their index descriptors
#[derive(Debug, Default)]
pub struct SchemaRegistry {
    collections: RwLock<HashMap<String, Registered>>,
}

impl SchemaRegistry {
    /// Creates an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a model and returns its descriptors, ordered by field name.
    ///
    /// Numeric attributes default to RANGE, everything else to EXACT; an
    /// explicit kind on the `IndexSpec` wins.
    pub fn register(&self, model: &DocumentModel) -> SchemaResult<Descriptors> {
        let mut collections = self
            .collections
            .write()
            .unwrap_or_else(PoisonError::into_inner);

        if let Some(existing) = collections.get(&model.collection) {
            if existing.model == *model {
                return Ok(existing.descriptors.clone());
            }
            return Err(SchemaError::conflict(&model.collection));
        }

        let descriptors = Arc::new(build_descriptors(model)?);
        collections.insert(
            model.collection.clone(),
            Registered {
                model: model.clone(),
                descriptors: descriptors.clone(),
            },
        );
        Ok(descriptors)
    }

    /// Returns the descriptors of a registered collection
    pub fn descriptors(&self, collection: &str) -> SchemaResult<Descriptors> {
        self.collections
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(collection)
            .map(|registered| registered.descriptors.clone())
            .ok_or_else(|| SchemaError::unknown_collection(collection))
    }

    /// Returns the descriptor of one field, if it is indexed
    pub fn descriptor(&self, collection: &str, field: &str) -> SchemaResult<Option<IndexDescriptor>> {
        let descriptors = self.descriptors(collection)?;
        Ok(descriptors.iter().find(|d| d.field == field).cloned())
    }

    /// Returns true if the collection has been registered
    pub fn is_registered(&self, collection: &str) -> bool {
        self.collections
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(collection)
    }

    /// Returns all registered collection names, sorted
    pub fn collections(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .collections
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect();
        names.sort();
        names
    }
}

/// Computes the descriptors of a model without registering it
pub fn build_descriptors(model: &DocumentModel) -> SchemaResult<Vec<IndexDescriptor>> {
    let mut descriptors = Vec::new();

    for (name, def) in model.indexed_fields() {
        if !def.field_type.is_scalar() {
            return Err(SchemaError::invalid_index(
                &model.collection,
                name,
                format!("{} attributes are not indexable", def.field_type.type_name()),
            ));
        }

        let default_kind = if def.field_type.is_numeric() {
            IndexKind::Range
        } else {
            IndexKind::Exact
        };
        let kind = def.index.and_then(|spec| spec.kind).unwrap_or(default_kind);

        if kind == IndexKind::Range && !def.field_type.is_numeric() {
            return Err(SchemaError::invalid_index(
                &model.collection,
                name,
                format!("range index requires a numeric type, found {}", def.field_type.type_name()),
            ));
        }

        descriptors.push(IndexDescriptor::new(&model.collection, name, kind, def.nullable));
    }

    Ok(descriptors)
}

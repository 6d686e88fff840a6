//! Documents
//!
//! A document is an identifier, the collection it belongs to, and a JSON
//! object of attributes. A missing attribute and an explicit `null` are the
//! same thing to the index engine.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::store::{StoreError, StoreResult};

/// Attribute map of a document
pub type Attributes = Map<String, Value>;

/// A stored document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Unique identifier inside the collection
    pub id: String,
    /// Collection (document type) name
    pub collection: String,
    /// Attribute values
    #[serde(default)]
    pub attributes: Attributes,
}

impl Document {
    /// Creates a document with a freshly generated identifier
    pub fn new(collection: impl Into<String>) -> Self {
        Self::with_id(collection, Uuid::new_v4().to_string())
    }

    /// Creates a document with an explicit identifier
    pub fn with_id(collection: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            collection: collection.into(),
            attributes: Map::new(),
        }
    }

    /// Builds a document from a JSON object. Non-object values yield an
    /// empty attribute map.
    pub fn from_json(collection: impl Into<String>, id: impl Into<String>, body: Value) -> Self {
        let attributes = match body {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        Self {
            id: id.into(),
            collection: collection.into(),
            attributes,
        }
    }

    /// Sets an attribute (builder style)
    pub fn set(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attributes.insert(field.into(), value.into());
        self
    }

    /// Sets an attribute in place
    pub fn insert(&mut self, field: impl Into<String>, value: impl Into<Value>) {
        self.attributes.insert(field.into(), value.into());
    }

    /// Returns the non-null value of an attribute
    pub fn value(&self, field: &str) -> Option<&Value> {
        non_null(&self.attributes, field)
    }

    /// Encodes the document for primary storage
    pub fn encode(&self) -> StoreResult<String> {
        serde_json::to_string(self).map_err(|e| StoreError::codec(&self.id, e.to_string()))
    }

    /// Decodes a document read from `key`
    pub fn decode(key: &str, raw: &str) -> StoreResult<Self> {
        serde_json::from_str(raw).map_err(|e| StoreError::codec(key, e.to_string()))
    }
}

/// Looks up an attribute, treating `null` as absent
pub fn non_null<'a>(attributes: &'a Attributes, field: &str) -> Option<&'a Value> {
    attributes.get(field).filter(|v| !v.is_null())
}

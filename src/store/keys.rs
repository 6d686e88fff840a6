//! Key naming
//!
//! Layout (with the default `idx` prefix):
//!
//! ```text
//! idx:<Collection>:<field>:<value>   exact bucket (set of ids)
//! idx:<Collection>:<field>           range structure (sorted set id -> score)
//! <Collection>:<id>                  primary document (JSON string)
//! <Collection>:all                   live ids of the collection (set)
//! ```
//!
//! The id `all` would address the membership set, so it is reserved.

/// Default prefix for index keys
pub const DEFAULT_INDEX_PREFIX: &str = "idx";

/// Key suffix of the membership set; no document may use it as its id
pub const MEMBERSHIP_SUFFIX: &str = "all";

/// Renders every key the crate touches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeySpace {
    index_prefix: String,
}

impl KeySpace {
    /// Creates a key space with the given index prefix
    pub fn new(index_prefix: impl Into<String>) -> Self {
        Self {
            index_prefix: index_prefix.into(),
        }
    }

    /// Returns the index prefix
    pub fn index_prefix(&self) -> &str {
        &self.index_prefix
    }

    /// Key of the exact-match bucket for one value
    pub fn exact_bucket(&self, collection: &str, field: &str, value: &str) -> String {
        format!("{}:{}:{}:{}", self.index_prefix, collection, field, value)
    }

    /// Key of the sorted set backing a range index
    pub fn range_index(&self, collection: &str, field: &str) -> String {
        format!("{}:{}:{}", self.index_prefix, collection, field)
    }

    /// Key of a primary document
    pub fn document(&self, collection: &str, id: &str) -> String {
        format!("{}:{}", collection, id)
    }

    /// Key of the collection membership set
    pub fn membership(&self, collection: &str) -> String {
        format!("{}:{}", collection, MEMBERSHIP_SUFFIX)
    }

    /// Returns true if `id` cannot be stored because its document key
    /// would be the membership key
    pub fn is_reserved_id(id: &str) -> bool {
        id == MEMBERSHIP_SUFFIX
    }
}

impl Default for KeySpace {
    fn default() -> Self {
        Self::new(DEFAULT_INDEX_PREFIX)
    }
}

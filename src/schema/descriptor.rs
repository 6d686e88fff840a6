//! Index descriptors

use serde::{Deserialize, Serialize};
use std::fmt;

/// How an indexed attribute is stored
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IndexKind {
    /// One set of ids per distinct value; equality lookups only
    Exact,
    /// One sorted set of id -> numeric score; bounded range lookups
    Range,
}

impl IndexKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            IndexKind::Exact => "EXACT",
            IndexKind::Range => "RANGE",
        }
    }
}

impl fmt::Display for IndexKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Immutable description of one indexed attribute
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IndexDescriptor {
    /// Collection the attribute belongs to
    pub collection: String,
    /// Attribute name
    pub field: String,
    /// Index structure
    pub kind: IndexKind,
    /// Whether null values are allowed (and left out of the index)
    pub nullable: bool,
}

impl IndexDescriptor {
    pub fn new(
        collection: impl Into<String>,
        field: impl Into<String>,
        kind: IndexKind,
        nullable: bool,
    ) -> Self {
        Self {
            collection: collection.into(),
            field: field.into(),
            kind,
            nullable,
        }
    }

    pub fn is_exact(&self) -> bool {
        self.kind == IndexKind::Exact
    }

    pub fn is_range(&self) -> bool {
        self.kind == IndexKind::Range
    }
}

//! Document model definitions
//!
//! A `DocumentModel` is the statically built description of one document
//! type: its collection name and its declared attributes. Attributes that
//! carry an `IndexSpec` are indexed.
//!
//! Supported attribute types:
//! - string: UTF-8 string
//! - int: 64-bit signed integer
//! - float: 64-bit floating point
//! - bool: Boolean
//! - object: Nested object (never indexable)
//! - array: Homogeneous array (never indexable)

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::descriptor::IndexKind;

/// Supported attribute types
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum FieldType {
    /// UTF-8 string
    String,
    /// 64-bit signed integer
    Int,
    /// 64-bit floating point
    Float,
    /// Boolean
    Bool,
    /// Nested object
    Object,
    /// Homogeneous array with single element type
    Array {
        #[serde(rename = "element_type")]
        element_type: Box<FieldType>,
    },
}

impl FieldType {
    /// Returns the type name for error messages
    pub fn type_name(&self) -> &'static str {
        match self {
            FieldType::String => "string",
            FieldType::Int => "int",
            FieldType::Float => "float",
            FieldType::Bool => "bool",
            FieldType::Object => "object",
            FieldType::Array { .. } => "array",
        }
    }

    /// Numeric types default to range indexes
    pub fn is_numeric(&self) -> bool {
        matches!(self, FieldType::Int | FieldType::Float)
    }

    /// Scalar types can be indexed at all
    pub fn is_scalar(&self) -> bool {
        !matches!(self, FieldType::Object | FieldType::Array { .. })
    }
}

/// Marks an attribute as indexed. `kind: None` lets the registry choose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct IndexSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<IndexKind>,
}

impl IndexSpec {
    /// Default kind for the attribute type
    pub fn auto() -> Self {
        Self { kind: None }
    }

    /// Force an exact-match index
    pub fn exact() -> Self {
        Self {
            kind: Some(IndexKind::Exact),
        }
    }

    /// Force a range index
    pub fn range() -> Self {
        Self {
            kind: Some(IndexKind::Range),
        }
    }
}

/// Attribute definition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDef {
    /// Attribute data type
    #[serde(flatten)]
    pub field_type: FieldType,
    /// Whether the attribute may be null or missing
    #[serde(default)]
    pub nullable: bool,
    /// Present when the attribute is indexed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index: Option<IndexSpec>,
}

impl FieldDef {
    /// Creates a non-nullable, unindexed attribute
    pub fn new(field_type: FieldType) -> Self {
        Self {
            field_type,
            nullable: false,
            index: None,
        }
    }

    pub fn string() -> Self {
        Self::new(FieldType::String)
    }

    pub fn int() -> Self {
        Self::new(FieldType::Int)
    }

    pub fn float() -> Self {
        Self::new(FieldType::Float)
    }

    pub fn bool() -> Self {
        Self::new(FieldType::Bool)
    }

    pub fn object() -> Self {
        Self::new(FieldType::Object)
    }

    pub fn array(element_type: FieldType) -> Self {
        Self::new(FieldType::Array {
            element_type: Box::new(element_type),
        })
    }

    /// Allows null values
    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    /// Indexes the attribute with the default kind for its type
    pub fn indexed(mut self) -> Self {
        self.index = Some(IndexSpec::auto());
        self
    }

    /// Indexes the attribute with an explicit kind
    pub fn indexed_as(mut self, kind: IndexKind) -> Self {
        self.index = Some(IndexSpec { kind: Some(kind) });
        self
    }

    /// Returns true if the attribute is indexed
    pub fn is_indexed(&self) -> bool {
        self.index.is_some()
    }
}

/// A document type: collection name plus attribute definitions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentModel {
    /// Collection (key prefix) the documents live in
    pub collection: String,
    /// Attribute definitions, ordered by name
    pub fields: BTreeMap<String, FieldDef>,
}

impl DocumentModel {
    /// Creates a model with no attributes
    pub fn new(collection: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
            fields: BTreeMap::new(),
        }
    }

    /// Adds an attribute
    pub fn field(mut self, name: impl Into<String>, def: FieldDef) -> Self {
        self.fields.insert(name.into(), def);
        self
    }

    /// Iterates over indexed attributes in name order
    pub fn indexed_fields(&self) -> impl Iterator<Item = (&String, &FieldDef)> {
        self.fields.iter().filter(|(_, def)| def.is_indexed())
    }
}

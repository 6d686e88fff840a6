//! Conversion of attribute values to index representations
//!
//! - Exact buckets are addressed by a string rendering of the value.
//!   Integral floats render like integers so `299` and `299.0` share a
//!   bucket. Strings are used verbatim. Arrays and objects have no bucket.
//! - Range scores are the numeric value as `f64`. No coercion: numeric
//!   strings and booleans have no score.

use serde_json::Value;

use crate::schema::{IndexDescriptor, IndexKind};

/// Largest integer an `f64` represents exactly
const MAX_EXACT_INT: f64 = 9_007_199_254_740_992.0;

/// An attribute value converted for one index
#[derive(Debug, Clone, PartialEq)]
pub enum IndexValue {
    /// Exact-index bucket name
    Bucket(String),
    /// Range-index score
    Score(f64),
}

impl IndexValue {
    /// Converts a non-null value for the given descriptor
    pub fn for_descriptor(descriptor: &IndexDescriptor, value: &Value) -> Option<Self> {
        match descriptor.kind {
            IndexKind::Exact => bucket(value).map(IndexValue::Bucket),
            IndexKind::Range => score(value).map(IndexValue::Score),
        }
    }
}

/// Bucket name of a scalar value
pub fn bucket(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Some(i.to_string())
            } else if let Some(u) = n.as_u64() {
                Some(u.to_string())
            } else {
                n.as_f64().map(render_float)
            }
        }
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

/// Score of a numeric value
pub fn score(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64().filter(|f| f.is_finite()),
        _ => None,
    }
}

/// Short type name of a JSON value for error messages
pub fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn render_float(f: f64) -> String {
    if f.is_finite() && f.fract() == 0.0 && f.abs() <= MAX_EXACT_INT {
        format!("{}", f as i64)
    } else {
        format!("{}", f)
    }
}

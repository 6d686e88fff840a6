//! Filter structures
//!
//! A filter is an ordered list of predicates, AND-combined. Several
//! predicates on one range field express a bound pair.

use std::collections::BTreeSet;

use serde_json::Value;

/// Comparison operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    /// field = value
    Eq,
    /// field >= value
    Gte,
    /// field > value
    Gt,
    /// field <= value
    Lte,
    /// field < value
    Lt,
}

impl Operator {
    /// Returns true for equality
    pub fn is_equality(&self) -> bool {
        matches!(self, Operator::Eq)
    }

    /// Returns true for the four bound operators
    pub fn is_range(&self) -> bool {
        !self.is_equality()
    }

    /// Returns the operator name used in filter keys and explain output
    pub fn as_str(&self) -> &'static str {
        match self {
            Operator::Eq => "eq",
            Operator::Gte => "gte",
            Operator::Gt => "gt",
            Operator::Lte => "lte",
            Operator::Lt => "lt",
        }
    }

    /// Parses a filter-key suffix. Equality has no suffix.
    pub fn from_suffix(suffix: &str) -> Option<Self> {
        match suffix {
            "gte" => Some(Operator::Gte),
            "gt" => Some(Operator::Gt),
            "lte" => Some(Operator::Lte),
            "lt" => Some(Operator::Lt),
            _ => None,
        }
    }
}

/// A single predicate (field, operator, value)
#[derive(Debug, Clone, PartialEq)]
pub struct Predicate {
    /// Field name
    pub field: String,
    /// Comparison operator
    pub op: Operator,
    /// Operand
    pub value: Value,
}

impl Predicate {
    /// Create a predicate
    pub fn new(field: impl Into<String>, op: Operator, value: impl Into<Value>) -> Self {
        Self {
            field: field.into(),
            op,
            value: value.into(),
        }
    }

    /// Create an equality predicate
    pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::new(field, Operator::Eq, value)
    }

    /// Create a range predicate (gte)
    pub fn gte(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::new(field, Operator::Gte, value)
    }

    /// Create a range predicate (gt)
    pub fn gt(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::new(field, Operator::Gt, value)
    }

    /// Create a range predicate (lte)
    pub fn lte(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::new(field, Operator::Lte, value)
    }

    /// Create a range predicate (lt)
    pub fn lt(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::new(field, Operator::Lt, value)
    }

    /// Parses the keyword form `field` / `field__gte` / `field__lt` ...
    ///
    /// A key whose suffix is not an operator is taken as a plain field name.
    pub fn parse(key: &str, value: impl Into<Value>) -> Self {
        if let Some((field, suffix)) = key.rsplit_once("__") {
            if let Some(op) = Operator::from_suffix(suffix) {
                return Self::new(field, op, value);
            }
        }
        Self::eq(key, value)
    }
}

/// AND-combination of predicates, in insertion order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    predicates: Vec<Predicate>,
}

impl Filter {
    /// The empty filter: matches every document of the collection
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a filter from keyword pairs
    pub fn parse<K, V, I>(pairs: I) -> Self
    where
        K: AsRef<str>,
        V: Into<Value>,
        I: IntoIterator<Item = (K, V)>,
    {
        Self {
            predicates: pairs
                .into_iter()
                .map(|(k, v)| Predicate::parse(k.as_ref(), v))
                .collect(),
        }
    }

    /// Adds a predicate (builder style)
    pub fn with(mut self, predicate: Predicate) -> Self {
        self.predicates.push(predicate);
        self
    }

    /// Adds an equality predicate
    pub fn eq(self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.with(Predicate::eq(field, value))
    }

    /// Adds a `>=` bound
    pub fn gte(self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.with(Predicate::gte(field, value))
    }

    /// Adds a `>` bound
    pub fn gt(self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.with(Predicate::gt(field, value))
    }

    /// Adds a `<=` bound
    pub fn lte(self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.with(Predicate::lte(field, value))
    }

    /// Adds a `<` bound
    pub fn lt(self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.with(Predicate::lt(field, value))
    }

    /// Adds a predicate in place
    pub fn push(&mut self, predicate: Predicate) {
        self.predicates.push(predicate);
    }

    /// The predicates in insertion order
    pub fn predicates(&self) -> &[Predicate] {
        &self.predicates
    }

    /// Distinct referenced fields, sorted
    pub fn fields(&self) -> BTreeSet<&str> {
        self.predicates.iter().map(|p| p.field.as_str()).collect()
    }

    /// Predicates on one field
    pub fn on_field<'a>(&'a self, field: &'a str) -> impl Iterator<Item = &'a Predicate> + 'a {
        self.predicates.iter().filter(move |p| p.field == field)
    }

    /// Returns true if the filter has no predicate
    pub fn is_empty(&self) -> bool {
        self.predicates.is_empty()
    }

    /// Number of predicates
    pub fn len(&self) -> usize {
        self.predicates.len()
    }
}

impl FromIterator<Predicate> for Filter {
    fn from_iter<I: IntoIterator<Item = Predicate>>(iter: I) -> Self {
        Self {
            predicates: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_suffixes() {
        assert_eq!(Predicate::parse("price__gte", 10), Predicate::gte("price", 10));
        assert_eq!(Predicate::parse("price__lt", 10), Predicate::lt("price", 10));
        assert_eq!(
            Predicate::parse("category", "books"),
            Predicate::eq("category", "books")
        );
    }

    #[test]
    fn test_unknown_suffix_is_part_of_field() {
        let p = Predicate::parse("price__between", json!([1, 2]));
        assert_eq!(p.field, "price__between");
        assert_eq!(p.op, Operator::Eq);
    }

    #[test]
    fn test_filter_builder_keeps_order() {
        let filter = Filter::new().gte("price", 10).eq("category", "books").lte("price", 20);
        assert_eq!(filter.len(), 3);
        assert_eq!(filter.predicates()[1].field, "category");
        assert_eq!(filter.fields().into_iter().collect::<Vec<_>>(), vec!["category", "price"]);
        assert_eq!(filter.on_field("price").count(), 2);
    }

    #[test]
    fn test_filter_parse_pairs() {
        let filter = Filter::parse([("price__lte", json!(200)), ("stock__gte", json!(40))]);
        assert_eq!(
            filter,
            Filter::new().lte("price", 200).gte("stock", 40)
        );
    }
}

//! Lookup bounds
//!
//! Folds all predicates on one field into a single lookup:
//!
//! - EXACT fields accept equality only; distinct values cannot all hold
//! - RANGE fields intersect every bound; equality is `[v, v]`
//!
//! An unsatisfiable combination yields `Bounds::Empty`, which the executor
//! answers without contacting the store.

use std::fmt;

use serde_json::Value;

use crate::index::{bucket, score};
use crate::schema::{IndexDescriptor, IndexKind};
use crate::store::{ScoreBound, ScoreRange};

use super::ast::{Operator, Predicate};
use super::errors::{PlannerError, PlannerResult};

/// Concrete bounds of one lookup
#[derive(Debug, Clone, PartialEq)]
pub enum Bounds {
    /// Members of one exact bucket
    Exact(String),
    /// Range-index members scored inside the range
    Range(ScoreRange),
    /// No document can match
    Empty,
}

impl Bounds {
    /// Returns true for the unsatisfiable lookup
    pub fn is_empty(&self) -> bool {
        matches!(self, Bounds::Empty)
    }
}

impl fmt::Display for Bounds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Bounds::Exact(value) => write!(f, "= {:?}", value),
            Bounds::Range(range) => write!(f, "in {}", range),
            Bounds::Empty => write!(f, "unsatisfiable"),
        }
    }
}

/// Folds the predicates of one field into its bounds
pub fn fold_bounds(descriptor: &IndexDescriptor, predicates: &[&Predicate]) -> PlannerResult<Bounds> {
    match descriptor.kind {
        IndexKind::Exact => fold_exact(descriptor, predicates),
        IndexKind::Range => fold_range(descriptor, predicates),
    }
}

fn fold_exact(descriptor: &IndexDescriptor, predicates: &[&Predicate]) -> PlannerResult<Bounds> {
    let mut wanted: Option<String> = None;
    let mut conflict = false;

    for predicate in predicates {
        if !predicate.op.is_equality() {
            return Err(PlannerError::unsupported_operator(
                &descriptor.field,
                predicate.op,
                descriptor.kind,
            ));
        }
        let value = exact_operand(&descriptor.field, &predicate.value)?;
        match &wanted {
            Some(existing) if *existing != value => conflict = true,
            Some(_) => {}
            None => wanted = Some(value),
        }
    }

    match wanted {
        Some(_) if conflict => Ok(Bounds::Empty),
        Some(value) => Ok(Bounds::Exact(value)),
        None => Err(PlannerError::query_invalid(format!(
            "No predicate for field '{}'",
            descriptor.field
        ))),
    }
}

fn fold_range(descriptor: &IndexDescriptor, predicates: &[&Predicate]) -> PlannerResult<Bounds> {
    let mut range = ScoreRange::all();

    for predicate in predicates {
        let v = score(&predicate.value).ok_or_else(|| {
            PlannerError::invalid_value(&descriptor.field, &predicate.value, "a finite number")
        })?;
        let narrowed = match predicate.op {
            Operator::Eq => ScoreRange::between(v, v),
            Operator::Gte => ScoreRange::new(ScoreBound::Inclusive(v), ScoreBound::Unbounded),
            Operator::Gt => ScoreRange::new(ScoreBound::Exclusive(v), ScoreBound::Unbounded),
            Operator::Lte => ScoreRange::new(ScoreBound::Unbounded, ScoreBound::Inclusive(v)),
            Operator::Lt => ScoreRange::new(ScoreBound::Unbounded, ScoreBound::Exclusive(v)),
        };
        range = range.intersect(narrowed);
    }

    if range.is_empty() {
        Ok(Bounds::Empty)
    } else {
        Ok(Bounds::Range(range))
    }
}

fn exact_operand(field: &str, value: &Value) -> PlannerResult<String> {
    bucket(value).ok_or_else(|| PlannerError::invalid_value(field, value, "a non-null scalar"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::planner::PlannerErrorCode;
    use serde_json::json;

    fn exact() -> IndexDescriptor {
        IndexDescriptor::new("Product", "category", IndexKind::Exact, false)
    }

    fn range() -> IndexDescriptor {
        IndexDescriptor::new("Product", "price", IndexKind::Range, false)
    }

    #[test]
    fn test_exact_equality() {
        let p = Predicate::eq("category", "books");
        assert_eq!(
            fold_bounds(&exact(), &[&p]).unwrap(),
            Bounds::Exact("books".into())
        );
    }

    #[test]
    fn test_exact_conflicting_equalities_are_empty() {
        let a = Predicate::eq("category", "books");
        let b = Predicate::eq("category", "games");
        assert!(fold_bounds(&exact(), &[&a, &b]).unwrap().is_empty());

        let c = Predicate::eq("category", "books");
        assert_eq!(
            fold_bounds(&exact(), &[&a, &c]).unwrap(),
            Bounds::Exact("books".into())
        );
    }

    #[test]
    fn test_range_operator_on_exact_rejected() {
        let p = Predicate::gte("category", "a");
        let err = fold_bounds(&exact(), &[&p]).unwrap_err();
        assert_eq!(err.code(), PlannerErrorCode::UnsupportedOperator);
    }

    #[test]
    fn test_range_tightening() {
        let preds = [
            Predicate::gte("price", 10),
            Predicate::gt("price", 10),
            Predicate::lte("price", 50),
            Predicate::lt("price", 40),
        ];
        let refs: Vec<&Predicate> = preds.iter().collect();
        assert_eq!(
            fold_bounds(&range(), &refs).unwrap(),
            Bounds::Range(ScoreRange::new(
                ScoreBound::Exclusive(10.0),
                ScoreBound::Exclusive(40.0)
            ))
        );
    }

    #[test]
    fn test_range_equality_is_point() {
        let p = Predicate::eq("price", 299);
        assert_eq!(
            fold_bounds(&range(), &[&p]).unwrap(),
            Bounds::Range(ScoreRange::between(299.0, 299.0))
        );
    }

    #[test]
    fn test_contradictory_range_is_empty() {
        let a = Predicate::gt("price", 100);
        let b = Predicate::lt("price", 50);
        assert!(fold_bounds(&range(), &[&a, &b]).unwrap().is_empty());

        let c = Predicate::gte("price", 5);
        let d = Predicate::lt("price", 5);
        assert!(fold_bounds(&range(), &[&c, &d]).unwrap().is_empty());
    }

    #[test]
    fn test_non_numeric_range_operand_rejected() {
        let p = Predicate::gte("price", "100");
        let err = fold_bounds(&range(), &[&p]).unwrap_err();
        assert_eq!(err.code(), PlannerErrorCode::InvalidValue);

        let p = Predicate::eq("category", json!(null));
        let err = fold_bounds(&exact(), &[&p]).unwrap_err();
        assert_eq!(err.code(), PlannerErrorCode::InvalidValue);
    }
}

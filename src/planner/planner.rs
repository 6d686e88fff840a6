//! Query planner
//!
//! Turns a filter into one lookup per referenced field, ordered by field
//! name. Every field must carry an index; there is no scan fallback.
//! Planning is pure: same descriptors and filter, same plan.

use std::collections::BTreeMap;
use std::fmt;

use crate::schema::{IndexDescriptor, IndexKind};

use super::ast::{Filter, Predicate};
use super::bounds::{fold_bounds, Bounds};
use super::errors::{PlannerError, PlannerResult};

/// One index lookup
#[derive(Debug, Clone, PartialEq)]
pub struct Lookup {
    /// Field the lookup reads
    pub field: String,
    /// Index structure to read
    pub kind: IndexKind,
    /// Concrete bounds
    pub bounds: Bounds,
}

impl fmt::Display for Lookup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.kind, self.field, self.bounds)
    }
}

/// Immutable lookup plan
#[derive(Debug, Clone, PartialEq)]
pub struct LookupPlan {
    /// Collection to query
    pub collection: String,
    /// Lookups ordered by field name; empty means "every live document"
    pub lookups: Vec<Lookup>,
}

impl LookupPlan {
    /// Returns true when the plan reads the membership set only
    pub fn is_full_collection(&self) -> bool {
        self.lookups.is_empty()
    }

    /// Returns true when some lookup can never match
    pub fn is_unsatisfiable(&self) -> bool {
        self.lookups.iter().any(|l| l.bounds.is_empty())
    }
}

/// Query planner over the descriptors of one collection
pub struct QueryPlanner<'a> {
    collection: &'a str,
    descriptors: &'a [IndexDescriptor],
}

impl<'a> QueryPlanner<'a> {
    /// Creates a new planner
    pub fn new(collection: &'a str, descriptors: &'a [IndexDescriptor]) -> Self {
        Self {
            collection,
            descriptors,
        }
    }

    fn descriptor(&self, field: &str) -> Option<&'a IndexDescriptor> {
        self.descriptors.iter().find(|d| d.field == field)
    }

    /// Plans a filter, returning an immutable plan or error
    pub fn plan(&self, filter: &Filter) -> PlannerResult<LookupPlan> {
        // Group predicates by field, sorted by field name
        let mut by_field: BTreeMap<&str, Vec<&Predicate>> = BTreeMap::new();
        for predicate in filter.predicates() {
            by_field.entry(predicate.field.as_str()).or_default().push(predicate);
        }

        let mut lookups = Vec::with_capacity(by_field.len());
        for (field, predicates) in by_field {
            let descriptor = self
                .descriptor(field)
                .ok_or_else(|| PlannerError::unindexed_field(self.collection, field))?;
            lookups.push(Lookup {
                field: field.to_string(),
                kind: descriptor.kind,
                bounds: fold_bounds(descriptor, &predicates)?,
            });
        }

        Ok(LookupPlan {
            collection: self.collection.to_string(),
            lookups,
        })
    }
}

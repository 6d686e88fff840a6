//! Explain output
//!
//! Deterministic, human-readable rendering of a plan or of the rejection
//! that prevented one.

use std::fmt;

use super::errors::PlannerError;
use super::planner::LookupPlan;

/// Explain plan output
#[derive(Debug, Clone, PartialEq)]
pub struct ExplainPlan {
    /// Whether planning succeeded
    pub accepted: bool,
    /// Collection queried
    pub collection: String,
    /// One line per lookup, in execution order
    pub lookups: Vec<String>,
    /// True when the plan reads the membership set only
    pub full_collection: bool,
    /// True when some lookup can never match
    pub unsatisfiable: bool,
    /// Rejection reason (if rejected)
    pub rejection_reason: Option<String>,
    /// Rejection error code (if rejected)
    pub rejection_code: Option<String>,
}

impl ExplainPlan {
    /// Creates an explain plan from a successful plan
    pub fn from_plan(plan: &LookupPlan) -> Self {
        Self {
            accepted: true,
            collection: plan.collection.clone(),
            lookups: plan.lookups.iter().map(|l| l.to_string()).collect(),
            full_collection: plan.is_full_collection(),
            unsatisfiable: plan.is_unsatisfiable(),
            rejection_reason: None,
            rejection_code: None,
        }
    }

    /// Creates an explain plan from a planning error
    pub fn from_error(collection: &str, err: &PlannerError) -> Self {
        Self {
            accepted: false,
            collection: collection.to_string(),
            lookups: Vec::new(),
            full_collection: false,
            unsatisfiable: false,
            rejection_reason: Some(err.message().to_string()),
            rejection_code: Some(err.code().code().to_string()),
        }
    }
}

impl fmt::Display for ExplainPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== EXPLAIN PLAN ===")?;
        writeln!(f, "Collection: {}", self.collection)?;

        if self.accepted {
            writeln!(f, "Status: ACCEPTED")?;
            if self.full_collection {
                writeln!(f, "Scan: MEMBERSHIP")?;
            } else {
                writeln!(f, "Lookups:")?;
                for lookup in &self.lookups {
                    writeln!(f, "  - {}", lookup)?;
                }
            }
            if self.unsatisfiable {
                writeln!(f, "Result: EMPTY (no store call)")?;
            }
        } else {
            writeln!(f, "Status: REJECTED")?;
            if let Some(code) = &self.rejection_code {
                writeln!(f, "Error Code: {}", code)?;
            }
            if let Some(reason) = &self.rejection_reason {
                writeln!(f, "Reason: {}", reason)?;
            }
        }

        Ok(())
    }
}

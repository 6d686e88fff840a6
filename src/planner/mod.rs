//! Query planner
//!
//! - Every filtered field must be indexed (no scan fallback)
//! - One lookup per field, ordered by field name
//! - EXACT fields take equality; RANGE fields take any operator
//! - Unsatisfiable lookups are detected here and cost no store call

mod ast;
mod bounds;
mod errors;
mod explain;
mod planner;

pub use ast::{Filter, Operator, Predicate};
pub use bounds::{fold_bounds, Bounds};
pub use errors::{PlannerError, PlannerErrorCode, PlannerResult, Severity};
pub use explain::ExplainPlan;
pub use planner::{Lookup, LookupPlan, QueryPlanner};

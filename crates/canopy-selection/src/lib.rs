//! Canopy Selection
//!
//! This crate provides the planned field tree for Canopy. A planned tree is
//! the validated, flattened form of a request document that is ready for
//! execution.
//!
//! Key differences from `canopy-config`:
//! - Fragments (inline and named) are flattened into their parent selection
//! - Variables are substituted into arguments
//! - `skip`/`include` directives are evaluated and removed
//! - Fields sharing a response key are merged
//! - Nodes are immutable and cheap to share across tasks

mod error;
mod field;
mod planner;
mod selection;

pub use error::PlanError;
pub use field::FieldNode;
pub use planner::{PlannedQuery, Planner};
pub use selection::Selection;

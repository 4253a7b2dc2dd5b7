//! Canopy Config
//!
//! This crate contains the serializable request document types for Canopy.
//! These types represent a request before it is planned into the immutable
//! field tree the executor consumes.
//!
//! Documents can be loaded from:
//! - JSON files (via CLI with `canopy run query.json`)
//! - Any other serde source (embedding servers, tests)
//!
//! The planner in `canopy-selection` takes these types, substitutes variables,
//! evaluates `skip`/`include` directives and flattens fragments into a plain
//! ordered field tree.

mod argument;
mod directive;
mod query;
mod selection;

pub use argument::{ArgumentValue, Arguments, variable_name};
pub use directive::{Condition, DirectiveDef};
pub use query::{FragmentDef, QueryDef};
pub use selection::{FieldDef, SelectionDef};

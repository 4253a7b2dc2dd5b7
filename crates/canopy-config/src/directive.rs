use serde::{Deserialize, Serialize};

/// A directive attached to a field, inline fragment or fragment spread.
///
/// Only `skip` and `include` are understood by the planner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DirectiveDef {
  pub name: String,
  #[serde(rename = "if", default, skip_serializing_if = "Option::is_none")]
  pub condition: Option<Condition>,
}

/// The `if` argument of a `skip`/`include` directive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Condition {
  /// A literal `true`/`false`.
  Literal(bool),
  /// A `$variable` reference.
  Variable(String),
}

impl DirectiveDef {
  pub fn skip(condition: Condition) -> Self {
    Self {
      name: "skip".to_string(),
      condition: Some(condition),
    }
  }

  pub fn include(condition: Condition) -> Self {
    Self {
      name: "include".to_string(),
      condition: Some(condition),
    }
  }
}

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::directive::DirectiveDef;
use crate::selection::SelectionDef;

/// A complete request document.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct QueryDef {
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub operation_name: Option<String>,
  pub selection: Vec<SelectionDef>,
  /// Named fragments referenced by `fragment_spread` selections.
  #[serde(default, skip_serializing_if = "HashMap::is_empty")]
  pub fragments: HashMap<String, FragmentDef>,
  /// Variable defaults. Values passed at planning time take precedence.
  #[serde(default, skip_serializing_if = "serde_json::Map::is_empty")]
  pub variables: serde_json::Map<String, serde_json::Value>,
}

/// A named, reusable selection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FragmentDef {
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub type_condition: Option<String>,
  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub directives: Vec<DirectiveDef>,
  pub selection: Vec<SelectionDef>,
}

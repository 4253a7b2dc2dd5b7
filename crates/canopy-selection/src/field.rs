use serde::{Deserialize, Serialize};

use crate::selection::Selection;

/// A planned field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldNode {
  pub name: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub alias: Option<String>,
  #[serde(default, skip_serializing_if = "serde_json::Map::is_empty")]
  pub arguments: serde_json::Map<String, serde_json::Value>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub selection: Option<Selection>,
}

impl FieldNode {
  pub fn new(name: impl Into<String>) -> Self {
    Self {
      name: name.into(),
      alias: None,
      arguments: serde_json::Map::new(),
      selection: None,
    }
  }

  pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
    self.alias = Some(alias.into());
    self
  }

  pub fn with_argument(mut self, name: impl Into<String>, value: serde_json::Value) -> Self {
    self.arguments.insert(name.into(), value);
    self
  }

  pub fn with_selection(mut self, fields: impl IntoIterator<Item = FieldNode>) -> Self {
    self.selection = Some(Selection::new(fields));
    self
  }

  /// The key this field is stored under in the response: its alias, else its name.
  pub fn response_key(&self) -> &str {
    self.alias.as_deref().unwrap_or(&self.name)
  }

  /// Look up an argument by name.
  pub fn argument(&self, name: &str) -> Option<&serde_json::Value> {
    self.arguments.get(name)
  }
}

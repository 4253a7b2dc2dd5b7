use serde::{Deserialize, Serialize};

use crate::argument::Arguments;
use crate::directive::DirectiveDef;

/// One entry of a selection set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SelectionDef {
  /// A field to resolve.
  Field(FieldDef),
  /// An anonymous fragment whose fields are merged into the parent selection.
  InlineFragment {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    type_condition: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    directives: Vec<DirectiveDef>,
    selection: Vec<SelectionDef>,
  },
  /// A reference to a named fragment of the document.
  FragmentSpread {
    name: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    directives: Vec<DirectiveDef>,
  },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDef {
  pub name: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub alias: Option<String>,
  #[serde(default, skip_serializing_if = "Arguments::is_empty")]
  pub arguments: Arguments,
  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub directives: Vec<DirectiveDef>,
  /// Sub-selection for composite fields. `None` for leaves.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub selection: Option<Vec<SelectionDef>>,
}

impl FieldDef {
  /// A leaf field with no alias, arguments or directives.
  pub fn leaf(name: impl Into<String>) -> Self {
    Self {
      name: name.into(),
      alias: None,
      arguments: Arguments::new(),
      directives: Vec::new(),
      selection: None,
    }
  }

  /// A composite field selecting `selection`.
  pub fn object(name: impl Into<String>, selection: Vec<SelectionDef>) -> Self {
    Self {
      selection: Some(selection),
      ..Self::leaf(name)
    }
  }

  /// The key this field is stored under in the response.
  pub fn response_key(&self) -> &str {
    self.alias.as_deref().unwrap_or(&self.name)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::directive::Condition;
  use crate::query::QueryDef;

  #[test]
  fn test_parse_document() {
    let doc: QueryDef = serde_json::from_value(serde_json::json!({
      "operation_name": "Profile",
      "selection": [
        { "kind": "field", "name": "user", "arguments": { "id": "$id" }, "selection": [
          { "kind": "field", "name": "name", "alias": "fullName" },
          { "kind": "fragment_spread", "name": "contact" },
          { "kind": "inline_fragment", "type_condition": "Admin",
            "directives": [{ "name": "include", "if": "$admin" }],
            "selection": [{ "kind": "field", "name": "permissions" }] }
        ]}
      ],
      "fragments": {
        "contact": { "selection": [{ "kind": "field", "name": "email" }] }
      },
      "variables": { "admin": false }
    }))
    .unwrap();

    assert_eq!(doc.operation_name.as_deref(), Some("Profile"));
    assert_eq!(doc.fragments.len(), 1);
    assert_eq!(doc.variables["admin"], false);

    let SelectionDef::Field(user) = &doc.selection[0] else {
      panic!("expected field");
    };
    assert_eq!(user.arguments["id"], "$id");

    let children = user.selection.as_ref().unwrap();
    let SelectionDef::Field(name) = &children[0] else {
      panic!("expected field");
    };
    assert_eq!(name.response_key(), "fullName");
    assert!(matches!(
      &children[1],
      SelectionDef::FragmentSpread { name, .. } if name == "contact"
    ));
    let SelectionDef::InlineFragment { directives, .. } = &children[2] else {
      panic!("expected inline fragment");
    };
    assert_eq!(
      directives[0].condition,
      Some(Condition::Variable("$admin".to_string()))
    );
  }

  #[test]
  fn test_literal_condition() {
    let directive: DirectiveDef =
      serde_json::from_value(serde_json::json!({ "name": "skip", "if": true })).unwrap();
    assert_eq!(directive, DirectiveDef::skip(Condition::Literal(true)));
  }

  #[test]
  fn test_leaf_serializes_compactly() {
    let value = serde_json::to_value(SelectionDef::Field(FieldDef::leaf("id"))).unwrap();
    assert_eq!(value, serde_json::json!({ "kind": "field", "name": "id" }));
  }
}

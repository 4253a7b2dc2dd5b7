//! Planning turns a request document into an executable field tree.

use canopy_config::{Condition, DirectiveDef, QueryDef, SelectionDef, variable_name};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::PlanError;
use crate::field::FieldNode;
use crate::selection::Selection;

/// A planned request: the flattened root selection plus its operation name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlannedQuery {
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub operation_name: Option<String>,
  pub selection: Selection,
}

/// Plans a [`QueryDef`] into a [`PlannedQuery`].
///
/// This process:
/// 1. Merges provided variables over the document's defaults
/// 2. Evaluates `skip`/`include` directives
/// 3. Flattens inline fragments and fragment spreads into their parent selection
/// 4. Merges fields that share a response key, keeping the first position
pub struct Planner<'a> {
  document: &'a QueryDef,
  variables: serde_json::Map<String, serde_json::Value>,
}

/// A selection set to expand, along with the fragments being expanded around it.
struct Scoped<'a> {
  defs: &'a [SelectionDef],
  fragments: Vec<&'a str>,
}

/// A field collected under one response key, sub-selections not yet expanded.
struct Collected<'a> {
  name: &'a str,
  alias: Option<&'a str>,
  arguments: serde_json::Map<String, serde_json::Value>,
  children: Option<Vec<Scoped<'a>>>,
}

impl<'a> Planner<'a> {
  /// Create a planner using only the document's default variables.
  pub fn new(document: &'a QueryDef) -> Self {
    Self {
      document,
      variables: document.variables.clone(),
    }
  }

  /// Provide variable values, overriding document defaults.
  pub fn with_variables(mut self, variables: serde_json::Map<String, serde_json::Value>) -> Self {
    self.variables.extend(variables);
    self
  }

  pub fn plan(&self) -> Result<PlannedQuery, PlanError> {
    let root = Scoped {
      defs: &self.document.selection,
      fragments: Vec::new(),
    };
    Ok(PlannedQuery {
      operation_name: self.document.operation_name.clone(),
      selection: self.build(vec![root])?,
    })
  }

  /// Collect all scoped selection sets into one ordered field list, then
  /// expand each field's merged sub-selection.
  fn build(&self, sets: Vec<Scoped<'a>>) -> Result<Selection, PlanError> {
    let mut collected = IndexMap::new();
    for set in sets {
      let mut fragments = set.fragments;
      self.collect(set.defs, &mut fragments, &mut collected)?;
    }

    let mut fields = Vec::with_capacity(collected.len());
    for (_, field) in collected {
      let selection = match field.children {
        Some(children) => Some(self.build(children)?),
        None => None,
      };
      fields.push(FieldNode {
        name: field.name.to_string(),
        alias: field.alias.map(str::to_string),
        arguments: field.arguments,
        selection,
      });
    }
    Ok(Selection::new(fields))
  }

  fn collect(
    &self,
    defs: &'a [SelectionDef],
    fragments: &mut Vec<&'a str>,
    out: &mut IndexMap<&'a str, Collected<'a>>,
  ) -> Result<(), PlanError> {
    for def in defs {
      match def {
        SelectionDef::Field(field) => {
          if !self.included(&field.directives)? {
            continue;
          }

          let key = field.response_key();
          let arguments = self.substitute_map(&field.arguments)?;
          let children = field.selection.as_deref().map(|defs| Scoped {
            defs,
            fragments: fragments.clone(),
          });

          match out.get_mut(key) {
            Some(existing) => {
              merge_field(key, existing, &field.name, &arguments, children)?;
            }
            None => {
              out.insert(
                key,
                Collected {
                  name: &field.name,
                  alias: field.alias.as_deref(),
                  arguments,
                  children: children.map(|c| vec![c]),
                },
              );
            }
          }
        }
        SelectionDef::InlineFragment {
          directives,
          selection,
          ..
        } => {
          if self.included(directives)? {
            self.collect(selection, fragments, out)?;
          }
        }
        SelectionDef::FragmentSpread { name, directives } => {
          if !self.included(directives)? {
            continue;
          }
          if fragments.contains(&name.as_str()) {
            return Err(PlanError::FragmentCycle { name: name.clone() });
          }

          let fragment = self
            .document
            .fragments
            .get(name)
            .ok_or_else(|| PlanError::UnknownFragment { name: name.clone() })?;
          if !self.included(&fragment.directives)? {
            continue;
          }

          fragments.push(name);
          let result = self.collect(&fragment.selection, fragments, out);
          fragments.pop();
          result?;
        }
      }
    }
    Ok(())
  }

  /// Evaluate `skip`/`include` directives; a node is kept only if every directive allows it.
  fn included(&self, directives: &[DirectiveDef]) -> Result<bool, PlanError> {
    for directive in directives {
      let skip_when = match directive.name.as_str() {
        "skip" => true,
        "include" => false,
        other => {
          return Err(PlanError::UnknownDirective {
            name: other.to_string(),
          });
        }
      };

      let condition = directive
        .condition
        .as_ref()
        .ok_or_else(|| PlanError::MissingCondition {
          directive: directive.name.clone(),
        })?;

      let value = match condition {
        Condition::Literal(value) => *value,
        Condition::Variable(reference) => {
          // A string without the `$` prefix is a literal, not a reference.
          let name = variable_name(reference).ok_or_else(|| PlanError::NonBooleanCondition {
            directive: directive.name.clone(),
            found: serde_json::Value::String(reference.clone()).to_string(),
          })?;
          match self.variable(name)? {
            serde_json::Value::Bool(value) => *value,
            other => {
              return Err(PlanError::NonBooleanCondition {
                directive: directive.name.clone(),
                found: other.to_string(),
              });
            }
          }
        }
      };

      if value == skip_when {
        return Ok(false);
      }
    }
    Ok(true)
  }

  fn variable(&self, name: &str) -> Result<&serde_json::Value, PlanError> {
    self
      .variables
      .get(name)
      .ok_or_else(|| PlanError::UndefinedVariable {
        name: name.to_string(),
      })
  }

  fn substitute_map(
    &self,
    arguments: &serde_json::Map<String, serde_json::Value>,
  ) -> Result<serde_json::Map<String, serde_json::Value>, PlanError> {
    arguments
      .iter()
      .map(|(k, v)| Ok((k.clone(), self.substitute(v)?)))
      .collect()
  }

  /// Replace `$variable` strings, recursing into lists and objects.
  fn substitute(&self, value: &serde_json::Value) -> Result<serde_json::Value, PlanError> {
    match value {
      serde_json::Value::String(s) => match variable_name(s) {
        Some(name) => self.variable(name).cloned(),
        None => Ok(value.clone()),
      },
      serde_json::Value::Array(items) => items
        .iter()
        .map(|item| self.substitute(item))
        .collect::<Result<Vec<_>, _>>()
        .map(serde_json::Value::Array),
      serde_json::Value::Object(map) => self.substitute_map(map).map(serde_json::Value::Object),
      _ => Ok(value.clone()),
    }
  }
}

/// Merge a repeated response key into the field collected first.
fn merge_field<'a>(
  key: &str,
  existing: &mut Collected<'a>,
  name: &str,
  arguments: &serde_json::Map<String, serde_json::Value>,
  children: Option<Scoped<'a>>,
) -> Result<(), PlanError> {
  let conflict = |message: String| PlanError::FieldConflict {
    response_key: key.to_string(),
    message,
  };

  if existing.name != name {
    return Err(conflict(format!(
      "'{}' and '{}' are different fields",
      existing.name, name
    )));
  }
  if existing.arguments != *arguments {
    return Err(conflict("fields have different arguments".to_string()));
  }

  match (&mut existing.children, children) {
    (Some(sets), Some(set)) => sets.push(set),
    (None, None) => {}
    _ => {
      return Err(conflict(
        "a leaf field and a composite field cannot be merged".to_string(),
      ));
    }
  }
  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;
  use canopy_config::{FieldDef, FragmentDef};
  use serde_json::json;

  fn field(name: &str) -> SelectionDef {
    SelectionDef::Field(FieldDef::leaf(name))
  }

  fn object(name: &str, selection: Vec<SelectionDef>) -> SelectionDef {
    SelectionDef::Field(FieldDef::object(name, selection))
  }

  fn spread(name: &str) -> SelectionDef {
    SelectionDef::FragmentSpread {
      name: name.to_string(),
      directives: vec![],
    }
  }

  fn document(selection: Vec<SelectionDef>) -> QueryDef {
    QueryDef {
      selection,
      ..Default::default()
    }
  }

  fn keys(selection: &Selection) -> Vec<&str> {
    selection.iter().map(|f| f.response_key()).collect()
  }

  #[test]
  fn test_plain_selection_keeps_order() {
    let doc = document(vec![field("c"), field("a"), field("b")]);
    let planned = Planner::new(&doc).plan().unwrap();

    assert_eq!(keys(&planned.selection), vec!["c", "a", "b"]);
  }

  #[test]
  fn test_inline_fragment_is_flattened_in_place() {
    let doc = document(vec![
      field("a"),
      SelectionDef::InlineFragment {
        type_condition: Some("User".to_string()),
        directives: vec![],
        selection: vec![field("b"), field("c")],
      },
      field("d"),
    ]);
    let planned = Planner::new(&doc).plan().unwrap();

    assert_eq!(keys(&planned.selection), vec!["a", "b", "c", "d"]);
  }

  #[test]
  fn test_fragment_spread_is_flattened() {
    let mut doc = document(vec![object("user", vec![field("id"), spread("names")])]);
    doc.fragments.insert(
      "names".to_string(),
      FragmentDef {
        type_condition: None,
        directives: vec![],
        selection: vec![field("first"), field("last")],
      },
    );
    let planned = Planner::new(&doc).plan().unwrap();

    let user = planned.selection.get("user").unwrap();
    assert_eq!(
      keys(user.selection.as_ref().unwrap()),
      vec!["id", "first", "last"]
    );
  }

  #[test]
  fn test_unknown_fragment() {
    let doc = document(vec![spread("missing")]);
    let err = Planner::new(&doc).plan().unwrap_err();

    assert_eq!(
      err,
      PlanError::UnknownFragment {
        name: "missing".to_string()
      }
    );
  }

  #[test]
  fn test_fragment_cycle_through_nested_field() {
    let mut doc = document(vec![spread("f")]);
    doc.fragments.insert(
      "f".to_string(),
      FragmentDef {
        type_condition: None,
        directives: vec![],
        selection: vec![object("child", vec![spread("f")])],
      },
    );
    let err = Planner::new(&doc).plan().unwrap_err();

    assert_eq!(
      err,
      PlanError::FragmentCycle {
        name: "f".to_string()
      }
    );
  }

  #[test]
  fn test_same_fragment_twice_is_not_a_cycle() {
    let mut doc = document(vec![spread("f"), object("nested", vec![spread("f")])]);
    doc.fragments.insert(
      "f".to_string(),
      FragmentDef {
        type_condition: None,
        directives: vec![],
        selection: vec![field("id")],
      },
    );
    let planned = Planner::new(&doc).plan().unwrap();

    assert_eq!(keys(&planned.selection), vec!["id", "nested"]);
  }

  #[test]
  fn test_repeated_fields_merge_subselections() {
    let doc = document(vec![
      object("user", vec![field("id")]),
      field("other"),
      object("user", vec![field("name"), field("id")]),
    ]);
    let planned = Planner::new(&doc).plan().unwrap();

    assert_eq!(keys(&planned.selection), vec!["user", "other"]);
    let user = planned.selection.get("user").unwrap();
    assert_eq!(keys(user.selection.as_ref().unwrap()), vec!["id", "name"]);
  }

  #[test]
  fn test_alias_conflict() {
    let mut aliased = FieldDef::leaf("b");
    aliased.alias = Some("a".to_string());
    let doc = document(vec![field("a"), SelectionDef::Field(aliased)]);
    let err = Planner::new(&doc).plan().unwrap_err();

    assert!(matches!(err, PlanError::FieldConflict { response_key, .. } if response_key == "a"));
  }

  #[test]
  fn test_variables_are_substituted() {
    let mut user = FieldDef::object("user", vec![field("id")]);
    user.arguments = json!({ "id": "$id", "filter": { "tags": ["x", "$tag"] }, "first": 3 })
      .as_object()
      .unwrap()
      .clone();
    let mut doc = document(vec![SelectionDef::Field(user)]);
    doc.variables.insert("tag".to_string(), json!("default"));

    let provided = json!({ "id": 42 }).as_object().unwrap().clone();
    let planned = Planner::new(&doc).with_variables(provided).plan().unwrap();

    let user = planned.selection.get("user").unwrap();
    assert_eq!(user.argument("id"), Some(&json!(42)));
    assert_eq!(user.argument("filter"), Some(&json!({ "tags": ["x", "default"] })));
    assert_eq!(user.argument("first"), Some(&json!(3)));
  }

  #[test]
  fn test_undefined_variable() {
    let mut user = FieldDef::leaf("user");
    user.arguments.insert("id".to_string(), json!("$id"));
    let doc = document(vec![SelectionDef::Field(user)]);

    let err = Planner::new(&doc).plan().unwrap_err();
    assert_eq!(
      err,
      PlanError::UndefinedVariable {
        name: "id".to_string()
      }
    );
  }

  #[test]
  fn test_skip_and_include() {
    let mut skipped = FieldDef::leaf("skipped");
    skipped.directives = vec![DirectiveDef::skip(Condition::Literal(true))];
    let mut hidden = FieldDef::leaf("hidden");
    hidden.directives = vec![DirectiveDef::include(Condition::Variable(
      "$show".to_string(),
    ))];
    let mut shown = FieldDef::leaf("shown");
    shown.directives = vec![DirectiveDef::skip(Condition::Variable("$hide".to_string()))];

    let mut doc = document(vec![
      SelectionDef::Field(skipped),
      SelectionDef::Field(hidden),
      SelectionDef::Field(shown),
    ]);
    doc.variables.insert("show".to_string(), json!(false));
    doc.variables.insert("hide".to_string(), json!(false));

    let planned = Planner::new(&doc).plan().unwrap();
    assert_eq!(keys(&planned.selection), vec!["shown"]);
  }

  #[test]
  fn test_non_boolean_condition() {
    let mut f = FieldDef::leaf("a");
    f.directives = vec![DirectiveDef::include(Condition::Variable("$n".to_string()))];
    let mut doc = document(vec![SelectionDef::Field(f)]);
    doc.variables.insert("n".to_string(), json!(1));

    let err = Planner::new(&doc).plan().unwrap_err();
    assert!(matches!(err, PlanError::NonBooleanCondition { .. }));
  }

  #[test]
  fn test_condition_requires_variable_prefix() {
    let mut f = FieldDef::leaf("a");
    f.directives = vec![DirectiveDef::include(Condition::Variable("admin".to_string()))];
    let mut doc = document(vec![SelectionDef::Field(f)]);
    doc.variables.insert("admin".to_string(), json!(true));

    let err = Planner::new(&doc).plan().unwrap_err();
    assert_eq!(
      err,
      PlanError::NonBooleanCondition {
        directive: "include".to_string(),
        found: "\"admin\"".to_string(),
      }
    );
  }

  #[test]
  fn test_unknown_directive() {
    let mut f = FieldDef::leaf("a");
    f.directives = vec![DirectiveDef {
      name: "defer".to_string(),
      condition: None,
    }];
    let doc = document(vec![SelectionDef::Field(f)]);

    let err = Planner::new(&doc).plan().unwrap_err();
    assert_eq!(
      err,
      PlanError::UnknownDirective {
        name: "defer".to_string()
      }
    );
  }

  #[test]
  fn test_empty_document() {
    let doc = document(vec![]);
    let planned = Planner::new(&doc).plan().unwrap();
    assert!(planned.selection.is_empty());
  }
}

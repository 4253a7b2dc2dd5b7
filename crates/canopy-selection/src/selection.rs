use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::field::FieldNode;

/// An ordered, immutable list of fields.
///
/// Fields are reference counted so tasks can hold on to the node they resolve
/// without copying its subtree.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Selection {
  fields: Vec<Arc<FieldNode>>,
}

impl Selection {
  pub fn new(fields: impl IntoIterator<Item = FieldNode>) -> Self {
    Self {
      fields: fields.into_iter().map(Arc::new).collect(),
    }
  }

  pub fn iter(&self) -> impl ExactSizeIterator<Item = &Arc<FieldNode>> {
    self.fields.iter()
  }

  pub fn len(&self) -> usize {
    self.fields.len()
  }

  pub fn is_empty(&self) -> bool {
    self.fields.is_empty()
  }

  /// Find a field by response key.
  pub fn get(&self, response_key: &str) -> Option<&FieldNode> {
    self
      .fields
      .iter()
      .map(|f| f.as_ref())
      .find(|f| f.response_key() == response_key)
  }

  /// Number of field nodes in this selection and all nested selections.
  pub fn node_count(&self) -> usize {
    self
      .fields
      .iter()
      .map(|f| 1 + f.selection.as_ref().map_or(0, Selection::node_count))
      .sum()
  }

  /// Depth of the deepest nested selection; a flat selection has depth 1.
  pub fn depth(&self) -> usize {
    if self.fields.is_empty() {
      return 0;
    }
    1 + self
      .fields
      .iter()
      .filter_map(|f| f.selection.as_ref())
      .map(Selection::depth)
      .max()
      .unwrap_or(0)
  }
}

impl FromIterator<FieldNode> for Selection {
  fn from_iter<I: IntoIterator<Item = FieldNode>>(iter: I) -> Self {
    Self::new(iter)
  }
}

impl<'a> IntoIterator for &'a Selection {
  type Item = &'a Arc<FieldNode>;
  type IntoIter = std::slice::Iter<'a, Arc<FieldNode>>;

  fn into_iter(self) -> Self::IntoIter {
    self.fields.iter()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn tree() -> Selection {
    Selection::new([
      FieldNode::new("a").with_selection([FieldNode::new("x"), FieldNode::new("y")]),
      FieldNode::new("b").with_alias("bee"),
    ])
  }

  #[test]
  fn test_counts() {
    let selection = tree();
    assert_eq!(selection.len(), 2);
    assert_eq!(selection.node_count(), 4);
    assert_eq!(selection.depth(), 2);
    assert_eq!(Selection::default().depth(), 0);
  }

  #[test]
  fn test_get_by_response_key() {
    let selection = tree();
    assert_eq!(selection.get("bee").map(|f| f.name.as_str()), Some("b"));
    assert!(selection.get("b").is_none());
  }

  #[test]
  fn test_serializes_as_list() {
    let value = serde_json::to_value(tree()).unwrap();
    assert_eq!(value[0]["name"], "a");
    assert_eq!(value[0]["selection"][1]["name"], "y");
    assert_eq!(value[1]["alias"], "bee");
  }
}

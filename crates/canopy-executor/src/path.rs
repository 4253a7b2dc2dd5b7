//! Response paths identify a position in the result tree.

use std::fmt;

use serde::{Deserialize, Serialize};

/// One step of a [`ResponsePath`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PathSegment {
  /// A field's response key.
  Key(String),
  /// A list position.
  Index(usize),
}

/// The position of a value in the response, e.g. `user.friends.0.name`.
///
/// Serializes as a list of keys and indices.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResponsePath(Vec<PathSegment>);

impl ResponsePath {
  /// The empty path of the root object.
  pub fn root() -> Self {
    Self::default()
  }

  /// This path extended by a response key.
  pub fn key(&self, key: impl Into<String>) -> Self {
    self.with(PathSegment::Key(key.into()))
  }

  /// This path extended by a list index.
  pub fn index(&self, index: usize) -> Self {
    self.with(PathSegment::Index(index))
  }

  pub fn segments(&self) -> &[PathSegment] {
    &self.0
  }

  pub fn len(&self) -> usize {
    self.0.len()
  }

  pub fn is_empty(&self) -> bool {
    self.0.is_empty()
  }

  fn with(&self, segment: PathSegment) -> Self {
    let mut segments = Vec::with_capacity(self.0.len() + 1);
    segments.extend_from_slice(&self.0);
    segments.push(segment);
    Self(segments)
  }
}

impl fmt::Display for ResponsePath {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    for (i, segment) in self.0.iter().enumerate() {
      if i > 0 {
        f.write_str(".")?;
      }
      match segment {
        PathSegment::Key(key) => f.write_str(key)?,
        PathSegment::Index(index) => write!(f, "{}", index)?,
      }
    }
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_display() {
    let path = ResponsePath::root().key("user").key("friends").index(2).key("name");
    assert_eq!(path.to_string(), "user.friends.2.name");
    assert_eq!(ResponsePath::root().to_string(), "");
  }

  #[test]
  fn test_serializes_as_list() {
    let path = ResponsePath::root().key("a").index(0);
    assert_eq!(
      serde_json::to_value(&path).unwrap(),
      serde_json::json!(["a", 0])
    );
  }
}

//! Assembled result values.

use indexmap::IndexMap;
use serde::{Serialize, Serializer};

/// A fully resolved response value.
///
/// Objects keep the order of the selection that produced them, so two runs of
/// the same request serialize identically no matter how tasks interleaved.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
  Scalar(serde_json::Value),
  Object(IndexMap<String, Value>),
  List(Vec<Value>),
}

impl Value {
  pub fn null() -> Self {
    Self::Scalar(serde_json::Value::Null)
  }

  pub fn as_object(&self) -> Option<&IndexMap<String, Value>> {
    match self {
      Self::Object(map) => Some(map),
      _ => None,
    }
  }

  pub fn as_list(&self) -> Option<&[Value]> {
    match self {
      Self::List(items) => Some(items),
      _ => None,
    }
  }

  /// Look up a key of an object value.
  pub fn get(&self, key: &str) -> Option<&Value> {
    self.as_object().and_then(|map| map.get(key))
  }

  /// Object keys in response order; empty for non-objects.
  pub fn keys(&self) -> Vec<&str> {
    self
      .as_object()
      .map(|map| map.keys().map(String::as_str).collect())
      .unwrap_or_default()
  }

  /// Convert into a plain JSON value, preserving key order.
  pub fn into_json(self) -> serde_json::Value {
    match self {
      Self::Scalar(value) => value,
      Self::Object(map) => serde_json::Value::Object(
        map
          .into_iter()
          .map(|(k, v)| (k, v.into_json()))
          .collect(),
      ),
      Self::List(items) => {
        serde_json::Value::Array(items.into_iter().map(Value::into_json).collect())
      }
    }
  }
}

impl From<serde_json::Value> for Value {
  fn from(value: serde_json::Value) -> Self {
    match value {
      serde_json::Value::Object(map) => {
        Self::Object(map.into_iter().map(|(k, v)| (k, v.into())).collect())
      }
      serde_json::Value::Array(items) => Self::List(items.into_iter().map(Value::from).collect()),
      scalar => Self::Scalar(scalar),
    }
  }
}

impl Serialize for Value {
  fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
    match self {
      Self::Scalar(value) => value.serialize(serializer),
      Self::Object(map) => map.serialize(serializer),
      Self::List(items) => items.serialize(serializer),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  #[test]
  fn test_serialization_keeps_insertion_order() {
    let mut map = IndexMap::new();
    map.insert("zeta".to_string(), Value::Scalar(json!(1)));
    map.insert("alpha".to_string(), Value::List(vec![Value::null()]));
    let value = Value::Object(map);

    assert_eq!(
      serde_json::to_string(&value).unwrap(),
      r#"{"zeta":1,"alpha":[null]}"#
    );
    assert_eq!(value.keys(), vec!["zeta", "alpha"]);
  }

  #[test]
  fn test_json_conversion() {
    let source = json!({ "b": [1, { "c": true }], "a": "x" });
    let value = Value::from(source.clone());

    assert_eq!(value.get("a"), Some(&Value::Scalar(json!("x"))));
    assert_eq!(value.keys(), vec!["b", "a"]);
    assert_eq!(value.into_json(), source);
  }
}

//! Result assembly: rebuilds the response tree from settled task handles.

use indexmap::IndexMap;

use crate::error::ExecutionError;
use crate::handle::{ObjectMap, PendingValue, TaskHandle, TaskState};
use crate::value::Value;

/// Assemble an object map into a [`Value::Object`], keys in selection order.
///
/// Only valid after the operation succeeded: every handle reachable from
/// `map` must be resolved, otherwise this returns a structural error.
pub fn assemble_object(map: &ObjectMap) -> Result<Value, ExecutionError> {
  let mut object = IndexMap::with_capacity(map.len());
  for (key, handle) in map {
    object.insert(key.clone(), assemble_handle(handle)?);
  }
  Ok(Value::Object(object))
}

/// Assemble the value held by one resolved handle.
pub fn assemble_handle(handle: &TaskHandle) -> Result<Value, ExecutionError> {
  match handle.state() {
    TaskState::Resolved(value) => assemble_value(value),
    TaskState::Pending => Err(ExecutionError::structural(format!(
      "field '{}' is still pending after the operation completed",
      handle.path()
    ))),
    TaskState::Failed(e) => Err(ExecutionError::structural(format!(
      "field '{}' failed after the operation completed: {}",
      handle.path(),
      e
    ))),
  }
}

fn assemble_value(value: &PendingValue) -> Result<Value, ExecutionError> {
  match value {
    PendingValue::Scalar(scalar) => Ok(Value::Scalar(scalar.clone())),
    PendingValue::Object(map) => assemble_object(map),
    PendingValue::List(items) => items
      .iter()
      .map(assemble_value)
      .collect::<Result<Vec<_>, _>>()
      .map(Value::List),
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::path::ResponsePath;
  use serde_json::json;

  fn resolved(path: ResponsePath, value: PendingValue) -> TaskHandle {
    let handle = TaskHandle::new(path);
    handle.resolve(value).unwrap();
    handle
  }

  #[test]
  fn test_assembles_in_key_order() {
    let root = ResponsePath::root();
    let a = root.key("a");

    let mut inner = ObjectMap::new();
    inner.insert("y".to_string(), resolved(a.key("y"), PendingValue::Scalar(json!(2))));
    inner.insert("x".to_string(), resolved(a.key("x"), PendingValue::Scalar(json!(1))));

    let mut map = ObjectMap::new();
    map.insert("b".to_string(), resolved(root.key("b"), PendingValue::Scalar(json!("b"))));
    map.insert("a".to_string(), resolved(a, PendingValue::Object(inner)));

    let value = assemble_object(&map).unwrap();
    assert_eq!(
      serde_json::to_string(&value).unwrap(),
      r#"{"b":"b","a":{"y":2,"x":1}}"#
    );
  }

  #[test]
  fn test_assembles_lists_in_index_order() {
    let root = ResponsePath::root();
    let items = ResponsePath::root().key("items");

    let mut first = ObjectMap::new();
    first.insert(
      "id".to_string(),
      resolved(items.index(0).key("id"), PendingValue::Scalar(json!(1))),
    );
    let list = PendingValue::List(vec![
      PendingValue::Object(first),
      PendingValue::List(vec![PendingValue::Scalar(json!(null))]),
    ]);

    let mut map = ObjectMap::new();
    map.insert("items".to_string(), resolved(root.key("items"), list));

    let value = assemble_object(&map).unwrap();
    assert_eq!(value.into_json(), json!({ "items": [{ "id": 1 }, [null]] }));
  }

  #[test]
  fn test_pending_handle_is_structural() {
    let mut map = ObjectMap::new();
    map.insert("a".to_string(), TaskHandle::new(ResponsePath::root().key("a")));

    let err = assemble_object(&map).unwrap_err();
    assert!(err.is_structural());
  }

  #[test]
  fn test_failed_handle_is_structural() {
    let handle = TaskHandle::new(ResponsePath::root().key("a"));
    handle.fail(ExecutionError::DispatcherClosed).unwrap();

    let err = assemble_handle(&handle).unwrap_err();
    assert!(err.is_structural());
  }

  #[test]
  fn test_empty_object() {
    let value = assemble_object(&ObjectMap::new()).unwrap();
    assert_eq!(serde_json::to_string(&value).unwrap(), "{}");
  }
}

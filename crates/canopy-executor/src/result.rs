use serde::Serialize;

use crate::value::Value;

/// The outcome of a successful operation.
#[derive(Debug, Clone, Serialize)]
pub struct ExecutionResult {
  pub operation_id: String,
  /// The assembled root object.
  pub data: Value,
  /// Number of field tasks that ran, list items' fields included.
  pub fields_resolved: usize,
}

//! Field task: resolves one field and fans out into its sub-selection.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use canopy_selection::FieldNode;
use futures::FutureExt;
use tracing::{debug, error, instrument, warn};

use crate::error::ExecutionError;
use crate::events::ExecutionEvent;
use crate::handle::{PendingValue, TaskHandle};
use crate::operation::OperationContext;
use crate::path::ResponsePath;
use crate::resolver::{ResolveContext, Shape};
use crate::selection::run_selection;

/// One unit of work: resolve a field, classify its value and complete it.
///
/// The task is registered with the barrier before it is submitted and reports
/// to it exactly once when it finishes. Any nested selection is registered
/// before that report, so the barrier cannot reach zero underneath it.
pub(crate) struct FieldTask {
  ctx: Arc<OperationContext>,
  field: Arc<FieldNode>,
  parent: Arc<serde_json::Value>,
  handle: TaskHandle,
}

impl FieldTask {
  pub(crate) fn new(
    ctx: Arc<OperationContext>,
    field: Arc<FieldNode>,
    parent: Arc<serde_json::Value>,
    handle: TaskHandle,
  ) -> Self {
    Self {
      ctx,
      field,
      parent,
      handle,
    }
  }

  #[instrument(
    name = "field_execute",
    skip(self),
    fields(
      operation_id = %self.ctx.operation_id,
      path = %self.handle.path(),
    )
  )]
  pub(crate) async fn run(self) {
    self.ctx.notify(ExecutionEvent::FieldStarted {
      operation_id: self.ctx.operation_id.clone(),
      path: self.handle.path().to_string(),
    });

    // A panicking resolver must still report, or the barrier never settles.
    let outcome = AssertUnwindSafe(self.execute())
      .catch_unwind()
      .await
      .unwrap_or_else(|panic| {
        Err(ExecutionError::TaskPanicked {
          path: self.handle.path().clone(),
          message: panic_message(&*panic),
        })
      });

    let result = outcome.and_then(|value| self.handle.resolve(value));
    match result {
      Ok(()) => {
        debug!(
          operation_id = %self.ctx.operation_id,
          path = %self.handle.path(),
          "field_resolved"
        );
        self.ctx.notify(ExecutionEvent::FieldResolved {
          operation_id: self.ctx.operation_id.clone(),
          path: self.handle.path().to_string(),
        });
        self.ctx.barrier.complete();
      }
      Err(e) => self.report_failure(e),
    }
  }

  async fn execute(&self) -> Result<PendingValue, ExecutionError> {
    let resolve_ctx = ResolveContext {
      parent: self.parent.clone(),
      field: self.field.clone(),
      path: self.handle.path().clone(),
    };

    let raw = self
      .ctx
      .resolver
      .resolve(&resolve_ctx)
      .await
      .map_err(|source| ExecutionError::Resolver {
        path: self.handle.path().clone(),
        source,
      })?;

    self.complete_value(raw, self.handle.path())
  }

  /// Turn a raw value into a pending value, fanning out composite parts.
  fn complete_value(
    &self,
    raw: serde_json::Value,
    path: &ResponsePath,
  ) -> Result<PendingValue, ExecutionError> {
    match self.ctx.classifier.classify(&self.field, &raw) {
      Shape::Scalar => Ok(PendingValue::Scalar(raw)),
      Shape::Object => match &self.field.selection {
        Some(selection) => {
          run_selection(&self.ctx, selection, Arc::new(raw), path).map(PendingValue::Object)
        }
        // Nothing to descend into.
        None => Ok(PendingValue::Scalar(raw)),
      },
      Shape::List => match raw {
        serde_json::Value::Array(items) => items
          .into_iter()
          .enumerate()
          .map(|(index, item)| self.complete_value(item, &path.index(index)))
          .collect::<Result<Vec<_>, _>>()
          .map(PendingValue::List),
        other => Err(ExecutionError::structural(format!(
          "field '{}' was classified as a list but resolved to {}",
          path,
          json_kind(&other)
        ))),
      },
    }
  }

  fn report_failure(&self, e: ExecutionError) {
    // A handle that already settled keeps its first state.
    let _ = self.handle.fail(e.clone());

    self.ctx.notify(ExecutionEvent::FieldFailed {
      operation_id: self.ctx.operation_id.clone(),
      path: self.handle.path().to_string(),
      error: e.to_string(),
    });

    if self.ctx.barrier.fail(e.clone()) {
      error!(
        operation_id = %self.ctx.operation_id,
        path = %self.handle.path(),
        error = %e,
        "field_failed"
      );
    } else {
      warn!(
        operation_id = %self.ctx.operation_id,
        path = %self.handle.path(),
        error = %e,
        "error_suppressed"
      );
      self.ctx.notify(ExecutionEvent::ErrorSuppressed {
        operation_id: self.ctx.operation_id.clone(),
        path: Some(self.handle.path().to_string()),
        error: e.to_string(),
      });
    }
  }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
  if let Some(message) = panic.downcast_ref::<&str>() {
    message.to_string()
  } else if let Some(message) = panic.downcast_ref::<String>() {
    message.clone()
  } else {
    "unknown panic payload".to_string()
  }
}

fn json_kind(value: &serde_json::Value) -> &'static str {
  match value {
    serde_json::Value::Null => "null",
    serde_json::Value::Bool(_) => "a boolean",
    serde_json::Value::Number(_) => "a number",
    serde_json::Value::String(_) => "a string",
    serde_json::Value::Array(_) => "an array",
    serde_json::Value::Object(_) => "an object",
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_panic_message() {
    let payload: Box<dyn Any + Send> = Box::new("boom");
    assert_eq!(panic_message(&*payload), "boom");

    let payload: Box<dyn Any + Send> = Box::new(String::from("owned boom"));
    assert_eq!(panic_message(&*payload), "owned boom");

    let payload: Box<dyn Any + Send> = Box::new(7_u8);
    assert_eq!(panic_message(&*payload), "unknown panic payload");
  }
}

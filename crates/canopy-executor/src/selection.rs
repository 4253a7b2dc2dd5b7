//! Selection execution: fans a list of sibling fields out into field tasks.

use std::sync::Arc;

use canopy_selection::Selection;
use tracing::trace;

use crate::error::ExecutionError;
use crate::field::FieldTask;
use crate::handle::{ObjectMap, TaskHandle};
use crate::operation::OperationContext;
use crate::path::ResponsePath;

/// Register and submit one task per field of `selection`, in order.
///
/// Returns as soon as every task is submitted; the returned map holds the
/// handles keyed by response key in selection order. Each registration
/// happens before its task is submitted, so a caller that itself holds a
/// registration keeps the barrier from reaching zero while this runs.
///
/// On error the caller is responsible for failing the barrier.
pub(crate) fn run_selection(
  ctx: &Arc<OperationContext>,
  selection: &Selection,
  parent: Arc<serde_json::Value>,
  path: &ResponsePath,
) -> Result<ObjectMap, ExecutionError> {
  let mut handles = ObjectMap::with_capacity(selection.len());

  for field in selection {
    let key = field.response_key();
    if handles.contains_key(key) {
      return Err(ExecutionError::structural(format!(
        "duplicate response key '{}' in selection at '{}'",
        key, path
      )));
    }

    let handle = TaskHandle::new(path.key(key));
    ctx.barrier.register();
    trace!(path = %handle.path(), "field task registered");

    let task = FieldTask::new(ctx.clone(), field.clone(), parent.clone(), handle.clone());
    if let Err(error) = ctx.dispatcher.submit(task.run()) {
      // The task will never run; settle its handle so nothing stays pending.
      let _ = handle.fail(error.clone());
      return Err(error);
    }

    handles.insert(key.to_string(), handle);
  }

  Ok(handles)
}

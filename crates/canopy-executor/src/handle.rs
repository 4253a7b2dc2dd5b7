//! Task handles and the in-flight result tree.

use std::fmt;
use std::sync::{Arc, OnceLock};

use indexmap::IndexMap;

use crate::error::ExecutionError;
use crate::path::ResponsePath;

/// Handles of a selection's field tasks, keyed by response key in selection order.
pub type ObjectMap = IndexMap<String, TaskHandle>;

/// The value a field task produced, possibly still referencing child tasks.
#[derive(Debug, Clone)]
pub enum PendingValue {
  /// A leaf value.
  Scalar(serde_json::Value),
  /// A composite value whose fields are resolved by their own tasks.
  Object(ObjectMap),
  /// A list; composite items hold their own object maps.
  List(Vec<PendingValue>),
}

/// Observed state of a [`TaskHandle`].
#[derive(Debug)]
pub enum TaskState<'a> {
  Pending,
  Resolved(&'a PendingValue),
  Failed(&'a ExecutionError),
}

/// A shared reference to one field task.
///
/// The state moves from pending to resolved or failed exactly once; the
/// handle is read-only afterwards.
#[derive(Clone)]
pub struct TaskHandle {
  inner: Arc<HandleInner>,
}

struct HandleInner {
  path: ResponsePath,
  outcome: OnceLock<Result<PendingValue, ExecutionError>>,
}

impl TaskHandle {
  pub fn new(path: ResponsePath) -> Self {
    Self {
      inner: Arc::new(HandleInner {
        path,
        outcome: OnceLock::new(),
      }),
    }
  }

  /// Position of the field in the response.
  pub fn path(&self) -> &ResponsePath {
    &self.inner.path
  }

  pub fn state(&self) -> TaskState<'_> {
    match self.inner.outcome.get() {
      None => TaskState::Pending,
      Some(Ok(value)) => TaskState::Resolved(value),
      Some(Err(error)) => TaskState::Failed(error),
    }
  }

  pub fn is_terminal(&self) -> bool {
    self.inner.outcome.get().is_some()
  }

  /// Move to `Resolved`. Fails if the handle already reached a terminal state.
  pub(crate) fn resolve(&self, value: PendingValue) -> Result<(), ExecutionError> {
    self.settle(Ok(value))
  }

  /// Move to `Failed`. Fails if the handle already reached a terminal state.
  pub(crate) fn fail(&self, error: ExecutionError) -> Result<(), ExecutionError> {
    self.settle(Err(error))
  }

  fn settle(&self, outcome: Result<PendingValue, ExecutionError>) -> Result<(), ExecutionError> {
    self.inner.outcome.set(outcome).map_err(|_| {
      ExecutionError::structural(format!(
        "task handle for field '{}' settled twice",
        self.inner.path
      ))
    })
  }
}

impl fmt::Debug for TaskHandle {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("TaskHandle")
      .field("path", &self.inner.path.to_string())
      .field("state", &self.state())
      .finish()
  }
}

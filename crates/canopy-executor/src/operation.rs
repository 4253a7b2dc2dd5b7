//! A single request's execution: the barrier, the root handles and the outcome.

use std::sync::Arc;

use canopy_selection::Selection;
use tracing::{error, info, instrument, warn};

use crate::assemble::assemble_object;
use crate::barrier::{BarrierWait, CompletionBarrier};
use crate::dispatcher::TaskDispatcher;
use crate::error::ExecutionError;
use crate::events::{ExecutionEvent, ExecutionNotifier};
use crate::handle::ObjectMap;
use crate::path::ResponsePath;
use crate::resolver::{FieldResolver, TypeClassifier};
use crate::result::ExecutionResult;
use crate::selection::run_selection;

/// State shared by every task of one operation.
pub(crate) struct OperationContext {
  pub(crate) operation_id: String,
  pub(crate) barrier: Arc<CompletionBarrier>,
  pub(crate) dispatcher: TaskDispatcher,
  pub(crate) resolver: Arc<dyn FieldResolver>,
  pub(crate) classifier: Arc<dyn TypeClassifier>,
  pub(crate) notifier: Arc<dyn ExecutionNotifier>,
}

impl OperationContext {
  pub(crate) fn notify(&self, event: ExecutionEvent) {
    self.notifier.notify(event);
  }
}

/// Lifecycle of an [`Operation`]. Each state is entered at most once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationState {
  Idle,
  Running,
  Succeeded,
  Failed,
}

/// One execution of a selection against a root value.
///
/// Created by [`Executor::operation`](crate::Executor::operation). The
/// operation yields exactly one outcome: the first [`Operation::wait`] returns
/// it, later calls return a structural error.
pub struct Operation {
  ctx: Arc<OperationContext>,
  operation_name: Option<String>,
  selection: Selection,
  root: Arc<serde_json::Value>,
  handles: ObjectMap,
  wait: Option<BarrierWait>,
  state: OperationState,
}

impl Operation {
  pub(crate) fn new(
    dispatcher: TaskDispatcher,
    resolver: Arc<dyn FieldResolver>,
    classifier: Arc<dyn TypeClassifier>,
    notifier: Arc<dyn ExecutionNotifier>,
    selection: Selection,
    root: serde_json::Value,
  ) -> Self {
    let (barrier, wait) = CompletionBarrier::new();
    let ctx = OperationContext {
      operation_id: uuid::Uuid::new_v4().to_string(),
      barrier,
      dispatcher,
      resolver,
      classifier,
      notifier,
    };

    Self {
      ctx: Arc::new(ctx),
      operation_name: None,
      selection,
      root: Arc::new(root),
      handles: ObjectMap::new(),
      wait: Some(wait),
      state: OperationState::Idle,
    }
  }

  /// Attach a name, reported in logs and events.
  pub fn with_name(mut self, name: impl Into<String>) -> Self {
    self.operation_name = Some(name.into());
    self
  }

  pub fn id(&self) -> &str {
    &self.ctx.operation_id
  }

  pub fn name(&self) -> Option<&str> {
    self.operation_name.as_deref()
  }

  pub fn state(&self) -> OperationState {
    self.state
  }

  /// Fan out the root selection without waiting for it.
  ///
  /// Must be called from within a tokio runtime. A submission failure is not
  /// returned here; it becomes the operation's outcome.
  pub fn start(&mut self) -> Result<(), ExecutionError> {
    if self.state != OperationState::Idle {
      return Err(ExecutionError::structural(format!(
        "operation {} already started",
        self.ctx.operation_id
      )));
    }
    self.state = OperationState::Running;

    info!(
      operation_id = %self.ctx.operation_id,
      operation_name = ?self.operation_name,
      fields = self.selection.len(),
      "operation_started"
    );
    self.ctx.notify(ExecutionEvent::OperationStarted {
      operation_id: self.ctx.operation_id.clone(),
      operation_name: self.operation_name.clone(),
    });

    // Held while the root fans out: the count cannot hit zero between two
    // root fields, and an empty selection completes on release.
    self.ctx.barrier.register();

    match run_selection(
      &self.ctx,
      &self.selection,
      self.root.clone(),
      &ResponsePath::root(),
    ) {
      Ok(handles) => self.handles = handles,
      Err(e) => {
        if !self.ctx.barrier.fail(e.clone()) {
          warn!(operation_id = %self.ctx.operation_id, error = %e, "error_suppressed");
          self.ctx.notify(ExecutionEvent::ErrorSuppressed {
            operation_id: self.ctx.operation_id.clone(),
            path: None,
            error: e.to_string(),
          });
        }
      }
    }

    self.ctx.barrier.complete();
    Ok(())
  }

  /// Wait for the outcome: the assembled result, or the first error.
  ///
  /// Starts the operation if it is still idle. Returns as soon as the first
  /// failure is recorded; sibling tasks already running are not cancelled.
  /// Cancel-safe: if this future is dropped before the outcome arrives, a
  /// later call still receives it.
  #[instrument(
    name = "operation_execute",
    skip(self),
    fields(
      operation_id = %self.ctx.operation_id,
    )
  )]
  pub async fn wait(&mut self) -> Result<ExecutionResult, ExecutionError> {
    if self.state == OperationState::Idle {
      self.start()?;
    }

    let Some(wait) = self.wait.as_mut() else {
      return Err(ExecutionError::structural(format!(
        "outcome of operation {} was already delivered",
        self.ctx.operation_id
      )));
    };

    // Cleared only once the outcome is in hand.
    let outcome = wait.await;
    self.wait = None;

    let result = match outcome {
      Ok(()) => assemble_object(&self.handles).map(|data| ExecutionResult {
        operation_id: self.ctx.operation_id.clone(),
        data,
        // Minus the operation's own registration.
        fields_resolved: self.ctx.barrier.registered().saturating_sub(1),
      }),
      Err(e) => Err(e),
    };

    match &result {
      Ok(r) => {
        self.state = OperationState::Succeeded;
        info!(
          operation_id = %self.ctx.operation_id,
          fields_resolved = r.fields_resolved,
          "operation_completed"
        );
        self.ctx.notify(ExecutionEvent::OperationCompleted {
          operation_id: self.ctx.operation_id.clone(),
          fields_resolved: r.fields_resolved,
        });
      }
      Err(e) => {
        self.state = OperationState::Failed;
        error!(
          operation_id = %self.ctx.operation_id,
          error = %e,
          "operation_failed"
        );
        self.ctx.notify(ExecutionEvent::OperationFailed {
          operation_id: self.ctx.operation_id.clone(),
          error: e.to_string(),
        });
      }
    }

    result
  }
}

impl std::fmt::Debug for Operation {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Operation")
      .field("operation_id", &self.ctx.operation_id)
      .field("operation_name", &self.operation_name)
      .field("state", &self.state)
      .finish()
  }
}

//! Executor: the entry point that owns the dispatcher and collaborators.

use std::sync::Arc;

use canopy_selection::{PlannedQuery, Selection};
use serde::{Deserialize, Serialize};

use crate::dispatcher::{Concurrency, TaskDispatcher};
use crate::error::ExecutionError;
use crate::events::{ExecutionNotifier, NoopNotifier};
use crate::operation::Operation;
use crate::resolver::{FieldResolver, JsonClassifier, TypeClassifier};
use crate::result::ExecutionResult;

/// Configuration for the executor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutorConfig {
  /// How many field tasks may run at once.
  #[serde(default)]
  pub concurrency: Concurrency,
}

/// Runs selections concurrently.
///
/// One executor serves any number of operations; each operation has its own
/// completion barrier and shares nothing with the others except the
/// dispatcher and the collaborators.
pub struct Executor {
  dispatcher: TaskDispatcher,
  resolver: Arc<dyn FieldResolver>,
  classifier: Arc<dyn TypeClassifier>,
  notifier: Arc<dyn ExecutionNotifier>,
}

impl Executor {
  /// Create an executor with its own dispatcher, a [`JsonClassifier`] and no
  /// event notifications.
  pub fn new(config: ExecutorConfig, resolver: impl FieldResolver + 'static) -> Self {
    Self::with_dispatcher(TaskDispatcher::new(config.concurrency), resolver)
  }

  /// Create an executor on an existing dispatcher.
  pub fn with_dispatcher(
    dispatcher: TaskDispatcher,
    resolver: impl FieldResolver + 'static,
  ) -> Self {
    Self {
      dispatcher,
      resolver: Arc::new(resolver),
      classifier: Arc::new(JsonClassifier),
      notifier: Arc::new(NoopNotifier),
    }
  }

  pub fn with_classifier(mut self, classifier: impl TypeClassifier + 'static) -> Self {
    self.classifier = Arc::new(classifier);
    self
  }

  pub fn with_notifier(mut self, notifier: impl ExecutionNotifier + 'static) -> Self {
    self.notifier = Arc::new(notifier);
    self
  }

  /// Prepare an operation without starting it.
  pub fn operation(&self, selection: &Selection, root: serde_json::Value) -> Operation {
    Operation::new(
      self.dispatcher.clone(),
      self.resolver.clone(),
      self.classifier.clone(),
      self.notifier.clone(),
      selection.clone(),
      root,
    )
  }

  /// Execute `selection` against `root` and return the assembled result.
  pub async fn execute(
    &self,
    selection: &Selection,
    root: serde_json::Value,
  ) -> Result<ExecutionResult, ExecutionError> {
    self.operation(selection, root).wait().await
  }

  /// Execute a planned query, naming the operation after it.
  pub async fn execute_query(
    &self,
    query: &PlannedQuery,
    root: serde_json::Value,
  ) -> Result<ExecutionResult, ExecutionError> {
    let mut operation = self.operation(&query.selection, root);
    if let Some(name) = &query.operation_name {
      operation = operation.with_name(name.clone());
    }
    operation.wait().await
  }

  pub fn dispatcher(&self) -> &TaskDispatcher {
    &self.dispatcher
  }

  /// Stop the dispatcher and wait for every task it is still running,
  /// including siblings of a field that failed.
  pub async fn shutdown(&self) {
    self.dispatcher.shutdown().await;
  }
}

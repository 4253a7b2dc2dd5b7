//! Execution events and notifiers for observability.
//!
//! Events are emitted while an operation runs so consumers can observe field
//! progress and see the errors that lost the race to fail the operation.

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

/// Events emitted during operation execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ExecutionEvent {
  /// Operation execution has started.
  OperationStarted {
    operation_id: String,
    operation_name: Option<String>,
  },

  /// A field task has started executing.
  FieldStarted { operation_id: String, path: String },

  /// A field task has resolved its value.
  FieldResolved { operation_id: String, path: String },

  /// A field task has failed.
  FieldFailed {
    operation_id: String,
    path: String,
    error: String,
  },

  /// A failure arrived after the operation had already failed; it does not
  /// affect the outcome.
  ErrorSuppressed {
    operation_id: String,
    path: Option<String>,
    error: String,
  },

  /// Operation execution has completed successfully.
  OperationCompleted {
    operation_id: String,
    fields_resolved: usize,
  },

  /// Operation execution has failed.
  OperationFailed { operation_id: String, error: String },
}

/// Trait for receiving execution events.
///
/// `notify` is called from field tasks running on many threads at once and
/// must not block.
pub trait ExecutionNotifier: Send + Sync {
  fn notify(&self, event: ExecutionEvent);
}

/// A no-op notifier that discards all events.
#[derive(Debug, Clone, Default)]
pub struct NoopNotifier;

impl ExecutionNotifier for NoopNotifier {
  fn notify(&self, _event: ExecutionEvent) {}
}

/// A notifier that sends events to an unbounded channel.
#[derive(Debug, Clone)]
pub struct ChannelNotifier {
  // NOTE: unbounded so a slow consumer never stalls a field task. Volume is
  // bounded by a few events per field.
  sender: mpsc::UnboundedSender<ExecutionEvent>,
}

impl ChannelNotifier {
  pub fn new(sender: mpsc::UnboundedSender<ExecutionEvent>) -> Self {
    Self { sender }
  }

  /// Create a notifier together with the receiving end of its channel.
  pub fn channel() -> (Self, mpsc::UnboundedReceiver<ExecutionEvent>) {
    let (sender, receiver) = mpsc::unbounded_channel();
    (Self::new(sender), receiver)
  }
}

impl ExecutionNotifier for ChannelNotifier {
  fn notify(&self, event: ExecutionEvent) {
    // Receiver may have been dropped
    let _ = self.sender.send(event);
  }
}

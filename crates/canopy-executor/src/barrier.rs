//! Completion barrier: a dynamic wait-group with a single-winner error latch.
//!
//! Tasks register before they start and report exactly once when they finish.
//! A parent registers its children before reporting its own completion, so the
//! outstanding count can only reach zero once the whole tree has finished.

use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::task::{Context, Poll};

use tokio::sync::oneshot;

use crate::error::ExecutionError;

type Outcome = Result<(), ExecutionError>;

/// Counts outstanding tasks of one operation and signals its waiter once.
pub struct CompletionBarrier {
  outstanding: AtomicUsize,
  registered: AtomicUsize,
  signal: Mutex<Option<oneshot::Sender<Outcome>>>,
}

/// The waiting side of a [`CompletionBarrier`].
pub struct BarrierWait {
  receiver: oneshot::Receiver<Outcome>,
}

impl CompletionBarrier {
  /// Create a barrier and the handle used to wait on it.
  pub fn new() -> (Arc<Self>, BarrierWait) {
    let (sender, receiver) = oneshot::channel();
    let barrier = Arc::new(Self {
      outstanding: AtomicUsize::new(0),
      registered: AtomicUsize::new(0),
      signal: Mutex::new(Some(sender)),
    });
    (barrier, BarrierWait { receiver })
  }

  /// Add one outstanding task. Must happen before the task starts.
  pub fn register(&self) {
    self.registered.fetch_add(1, Ordering::Relaxed);
    self.outstanding.fetch_add(1, Ordering::AcqRel);
  }

  /// Report one task as finished. Signals success when nothing is outstanding.
  pub fn complete(&self) {
    match self
      .outstanding
      .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| n.checked_sub(1))
    {
      Ok(1) => {
        self.signal(Ok(()));
      }
      Ok(_) => {}
      Err(_) => {
        self.signal(Err(ExecutionError::structural(
          "completion reported with no outstanding tasks",
        )));
      }
    }
  }

  /// Report a failure. The first call signals the waiter; later calls return
  /// `false` and their error is dropped.
  pub fn fail(&self, error: ExecutionError) -> bool {
    self.signal(Err(error))
  }

  /// Number of tasks registered but not yet reported.
  pub fn outstanding(&self) -> usize {
    self.outstanding.load(Ordering::Acquire)
  }

  /// Total number of registrations over the barrier's lifetime.
  pub fn registered(&self) -> usize {
    self.registered.load(Ordering::Relaxed)
  }

  /// Whether success or failure has already been signaled.
  pub fn is_signaled(&self) -> bool {
    self
      .signal
      .lock()
      .unwrap_or_else(PoisonError::into_inner)
      .is_none()
  }

  fn signal(&self, outcome: Outcome) -> bool {
    let sender = self
      .signal
      .lock()
      .unwrap_or_else(PoisonError::into_inner)
      .take();

    match sender {
      Some(sender) => {
        // The waiter may have been dropped; the outcome is still decided.
        let _ = sender.send(outcome);
        true
      }
      None => false,
    }
  }
}

impl BarrierWait {
  /// Wait until the barrier signals success or failure.
  pub async fn wait(self) -> Result<(), ExecutionError> {
    self.await
  }
}

/// Polling by reference is cancel-safe: dropping a `&mut BarrierWait` future
/// leaves the outcome in place for the next poll.
impl Future for BarrierWait {
  type Output = Result<(), ExecutionError>;

  fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
    Pin::new(&mut self.receiver).poll(cx).map(|received| {
      received.unwrap_or_else(|_| {
        Err(ExecutionError::structural(
          "completion barrier dropped without signaling",
        ))
      })
    })
  }
}

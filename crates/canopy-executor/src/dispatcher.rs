//! Task dispatcher: runs units of work concurrently on the tokio runtime.

use std::future::Future;
use std::num::NonZeroUsize;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::Semaphore;
use tokio_util::task::TaskTracker;
use tracing::{Instrument, debug};

use crate::error::ExecutionError;

/// How many units may execute at the same time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Concurrency {
  /// One running unit per available hardware thread.
  #[default]
  AvailableParallelism,
  /// At most this many running units (minimum one).
  Bounded(usize),
  /// No limit; every submission runs immediately.
  Unbounded,
}

impl Concurrency {
  /// The effective limit, or `None` when unbounded.
  pub fn limit(self) -> Option<usize> {
    match self {
      Self::AvailableParallelism => Some(
        std::thread::available_parallelism()
          .map(NonZeroUsize::get)
          .unwrap_or(1),
      ),
      Self::Bounded(n) => Some(n.max(1)),
      Self::Unbounded => None,
    }
  }
}

/// Runs submitted units concurrently.
///
/// A bounded dispatcher limits how many units are *executing*, not how many
/// are queued: units never wait on each other, so nested submissions cannot
/// deadlock. Cloning shares the same pool and lifecycle.
///
/// The dispatcher is started by [`TaskDispatcher::new`] and stopped by
/// [`TaskDispatcher::shutdown`], which rejects further submissions and waits
/// for everything already dispatched.
#[derive(Debug, Clone)]
pub struct TaskDispatcher {
  tracker: TaskTracker,
  permits: Option<Arc<Semaphore>>,
  limit: Option<usize>,
}

impl TaskDispatcher {
  pub fn new(concurrency: Concurrency) -> Self {
    let limit = concurrency.limit();
    Self {
      tracker: TaskTracker::new(),
      permits: limit.map(|n| Arc::new(Semaphore::new(n))),
      limit,
    }
  }

  /// Run `unit` concurrently. Must be called from within a tokio runtime.
  pub fn submit<F>(&self, unit: F) -> Result<(), ExecutionError>
  where
    F: Future<Output = ()> + Send + 'static,
  {
    if self.tracker.is_closed() {
      return Err(ExecutionError::DispatcherClosed);
    }

    let permits = self.permits.clone();
    self.tracker.spawn(
      async move {
        // Held until the unit finishes.
        let _permit = match permits {
          Some(permits) => permits.acquire_owned().await.ok(),
          None => None,
        };
        unit.await;
      }
      .in_current_span(),
    );
    Ok(())
  }

  /// Stop accepting work and wait for every dispatched unit to finish.
  pub async fn shutdown(&self) {
    self.tracker.close();
    debug!(in_flight = self.tracker.len(), "task dispatcher shutting down");
    self.tracker.wait().await;
    debug!("task dispatcher shut down");
  }

  pub fn is_shut_down(&self) -> bool {
    self.tracker.is_closed()
  }

  /// Units dispatched and not yet finished.
  pub fn in_flight(&self) -> usize {
    self.tracker.len()
  }

  /// Maximum number of concurrently executing units, `None` when unbounded.
  pub fn limit(&self) -> Option<usize> {
    self.limit
  }
}

impl Default for TaskDispatcher {
  fn default() -> Self {
    Self::new(Concurrency::default())
  }
}

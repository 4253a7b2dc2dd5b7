//! Execution error types.

use std::sync::Arc;

use crate::path::ResponsePath;

type BoxedSource = Arc<dyn std::error::Error + Send + Sync>;

/// An error raised by a field resolver.
///
/// The executor never rewrites a resolver error: message, code and source are
/// surfaced to the caller exactly as the resolver produced them.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{message}")]
pub struct ResolverError {
  message: String,
  code: Option<String>,
  #[source]
  source: Option<BoxedSource>,
}

impl ResolverError {
  pub fn new(message: impl Into<String>) -> Self {
    Self {
      message: message.into(),
      code: None,
      source: None,
    }
  }

  /// Wrap an underlying error, using its display text as the message.
  pub fn from_error(error: impl std::error::Error + Send + Sync + 'static) -> Self {
    Self {
      message: error.to_string(),
      code: None,
      source: Some(Arc::new(error)),
    }
  }

  /// Attach a machine-readable classification (e.g. `NOT_FOUND`).
  pub fn with_code(mut self, code: impl Into<String>) -> Self {
    self.code = Some(code.into());
    self
  }

  pub fn message(&self) -> &str {
    &self.message
  }

  pub fn code(&self) -> Option<&str> {
    self.code.as_deref()
  }
}

impl From<String> for ResolverError {
  fn from(message: String) -> Self {
    Self::new(message)
  }
}

impl From<&str> for ResolverError {
  fn from(message: &str) -> Self {
    Self::new(message)
  }
}

/// Errors that can end an operation.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ExecutionError {
  /// A field resolver failed. The first such failure wins.
  #[error("resolver failed for field '{path}': {source}")]
  Resolver {
    path: ResponsePath,
    #[source]
    source: ResolverError,
  },

  /// A field task panicked instead of returning.
  #[error("task for field '{path}' panicked: {message}")]
  TaskPanicked { path: ResponsePath, message: String },

  /// An internal invariant was violated; fatal to the operation.
  #[error("structural error: {message}")]
  Structural { message: String },

  /// Work was submitted to a dispatcher that has been shut down.
  #[error("task dispatcher is shut down")]
  DispatcherClosed,
}

impl ExecutionError {
  pub(crate) fn structural(message: impl Into<String>) -> Self {
    Self::Structural {
      message: message.into(),
    }
  }

  /// The resolver error, if this failure came from a resolver.
  pub fn resolver_error(&self) -> Option<&ResolverError> {
    match self {
      Self::Resolver { source, .. } => Some(source),
      _ => None,
    }
  }

  /// The field the failure is attributed to, if any.
  pub fn path(&self) -> Option<&ResponsePath> {
    match self {
      Self::Resolver { path, .. } | Self::TaskPanicked { path, .. } => Some(path),
      Self::Structural { .. } | Self::DispatcherClosed => None,
    }
  }

  /// Whether this is an internal invariant violation rather than a field failure.
  pub fn is_structural(&self) -> bool {
    matches!(self, Self::Structural { .. } | Self::TaskPanicked { .. })
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::error::Error;

  #[test]
  fn test_resolver_error_passthrough() {
    let io = std::io::Error::new(std::io::ErrorKind::TimedOut, "upstream timed out");
    let err = ResolverError::from_error(io).with_code("TIMEOUT");

    assert_eq!(err.to_string(), "upstream timed out");
    assert_eq!(err.code(), Some("TIMEOUT"));
    assert!(err.source().is_some());
  }

  #[test]
  fn test_execution_error_display() {
    let err = ExecutionError::Resolver {
      path: ResponsePath::root().key("user").key("name"),
      source: ResolverError::new("boom"),
    };

    assert_eq!(
      err.to_string(),
      "resolver failed for field 'user.name': boom"
    );
    assert_eq!(err.resolver_error().map(|e| e.message()), Some("boom"));
    assert!(!err.is_structural());
  }
}

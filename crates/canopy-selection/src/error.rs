use thiserror::Error;

/// Errors that can occur while planning a request document.
#[derive(Debug, Error, PartialEq)]
pub enum PlanError {
  /// A fragment spread references a fragment the document does not define.
  #[error("unknown fragment: {name}")]
  UnknownFragment { name: String },

  /// A fragment spreads itself, directly or through nested fields.
  #[error("fragment '{name}' spreads itself")]
  FragmentCycle { name: String },

  /// A `$variable` is referenced but neither provided nor defaulted.
  #[error("variable '{name}' is not defined")]
  UndefinedVariable { name: String },

  /// Directive name other than `skip`/`include`.
  #[error("unknown directive: @{name}")]
  UnknownDirective { name: String },

  /// `skip`/`include` without an `if` argument.
  #[error("directive @{directive} requires an 'if' argument")]
  MissingCondition { directive: String },

  /// The `if` argument did not evaluate to a boolean.
  #[error("directive @{directive} expects a boolean, got {found}")]
  NonBooleanCondition { directive: String, found: String },

  /// Two fields share a response key but cannot be merged.
  #[error("fields under response key '{response_key}' conflict: {message}")]
  FieldConflict {
    response_key: String,
    message: String,
  },
}

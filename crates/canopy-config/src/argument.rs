//! Argument value types for field configuration.
//!
//! Arguments are plain JSON values. A string starting with `$` is a variable
//! reference and is replaced by the planner with the variable's value.
//!
//! # Examples
//!
//! ```json
//! {
//!   "id": "$userId",
//!   "first": 10,
//!   "filter": { "status": "$status", "tags": ["a", "$tag"] }
//! }
//! ```
//!
//! With variables `{"userId": 7, "status": "open", "tag": "b"}` this plans to:
//! `{"id": 7, "first": 10, "filter": {"status": "open", "tags": ["a", "b"]}}`

/// A single argument value, possibly containing variable references.
pub type ArgumentValue = serde_json::Value;

/// Field arguments, keyed by argument name.
pub type Arguments = serde_json::Map<String, ArgumentValue>;

/// Returns the variable name if `value` is a `$variable` reference.
pub fn variable_name(value: &str) -> Option<&str> {
  value.strip_prefix('$').filter(|name| !name.is_empty())
}

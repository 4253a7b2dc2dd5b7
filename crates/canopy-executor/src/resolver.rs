//! Collaborator interfaces: field resolvers and value classification.
//!
//! The executor does not know how a field's value is computed or what type it
//! has. A [`FieldResolver`] produces the raw JSON value for one field and a
//! [`TypeClassifier`] decides whether that value is a leaf, an object to
//! descend into, or a list.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use canopy_selection::FieldNode;

use crate::error::ResolverError;
use crate::path::ResponsePath;

/// Everything a resolver gets to see about the field it resolves.
#[derive(Debug, Clone)]
pub struct ResolveContext {
  /// The raw value of the enclosing object (the root value for top-level fields).
  pub parent: Arc<serde_json::Value>,
  pub field: Arc<FieldNode>,
  pub path: ResponsePath,
}

impl ResolveContext {
  pub fn argument(&self, name: &str) -> Option<&serde_json::Value> {
    self.field.argument(name)
  }
}

/// Computes the raw value of a field.
///
/// Resolvers for different fields run truly concurrently; implementations
/// must not share mutable state unless it is safe to do so.
#[async_trait]
pub trait FieldResolver: Send + Sync {
  async fn resolve(&self, ctx: &ResolveContext) -> Result<serde_json::Value, ResolverError>;
}

/// Reads `parent[field.name]`; `null` when the parent is not an object or lacks the key.
#[derive(Debug, Clone, Copy, Default)]
pub struct PropertyResolver;

#[async_trait]
impl FieldResolver for PropertyResolver {
  async fn resolve(&self, ctx: &ResolveContext) -> Result<serde_json::Value, ResolverError> {
    Ok(
      ctx
        .parent
        .get(ctx.field.name.as_str())
        .cloned()
        .unwrap_or(serde_json::Value::Null),
    )
  }
}

/// Adapts an async closure into a [`FieldResolver`].
///
/// ```ignore
/// let resolver = FnResolver::new(|ctx: ResolveContext| async move {
///   Ok(serde_json::json!(ctx.field.name.len()))
/// });
/// ```
pub struct FnResolver<F> {
  func: F,
}

impl<F> FnResolver<F> {
  pub fn new<Fut>(func: F) -> Self
  where
    F: Fn(ResolveContext) -> Fut,
    Fut: Future<Output = Result<serde_json::Value, ResolverError>>,
  {
    Self { func }
  }
}

#[async_trait]
impl<F, Fut> FieldResolver for FnResolver<F>
where
  F: Fn(ResolveContext) -> Fut + Send + Sync,
  Fut: Future<Output = Result<serde_json::Value, ResolverError>> + Send + 'static,
{
  async fn resolve(&self, ctx: &ResolveContext) -> Result<serde_json::Value, ResolverError> {
    (self.func)(ctx.clone()).await
  }
}

/// Dispatches to a resolver bound to the field name, else to a fallback.
pub struct ResolverMap {
  resolvers: HashMap<String, Arc<dyn FieldResolver>>,
  fallback: Arc<dyn FieldResolver>,
}

impl ResolverMap {
  /// An empty map falling back to [`PropertyResolver`].
  pub fn new() -> Self {
    Self::with_fallback(PropertyResolver)
  }

  pub fn with_fallback(fallback: impl FieldResolver + 'static) -> Self {
    Self {
      resolvers: HashMap::new(),
      fallback: Arc::new(fallback),
    }
  }

  /// Bind `resolver` to every field named `field_name`.
  pub fn insert(&mut self, field_name: impl Into<String>, resolver: impl FieldResolver + 'static) {
    self.resolvers.insert(field_name.into(), Arc::new(resolver));
  }

  pub fn with(
    mut self,
    field_name: impl Into<String>,
    resolver: impl FieldResolver + 'static,
  ) -> Self {
    self.insert(field_name, resolver);
    self
  }

  fn resolver_for(&self, field_name: &str) -> &dyn FieldResolver {
    self
      .resolvers
      .get(field_name)
      .map(|r| r.as_ref())
      .unwrap_or(self.fallback.as_ref())
  }
}

impl Default for ResolverMap {
  fn default() -> Self {
    Self::new()
  }
}

#[async_trait]
impl FieldResolver for ResolverMap {
  async fn resolve(&self, ctx: &ResolveContext) -> Result<serde_json::Value, ResolverError> {
    self.resolver_for(&ctx.field.name).resolve(ctx).await
  }
}

#[async_trait]
impl<T: FieldResolver + ?Sized> FieldResolver for Arc<T> {
  async fn resolve(&self, ctx: &ResolveContext) -> Result<serde_json::Value, ResolverError> {
    self.as_ref().resolve(ctx).await
  }
}

/// The shape of a resolved raw value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
  /// A leaf; returned as is.
  Scalar,
  /// A composite object; its sub-selection is executed against it.
  Object,
  /// A list; every item is classified and completed on its own.
  List,
}

/// Decides the shape of a field's raw value (or of one of its list items).
pub trait TypeClassifier: Send + Sync {
  fn classify(&self, field: &FieldNode, value: &serde_json::Value) -> Shape;
}

/// Classifies by JSON structure: arrays are lists, objects are composite when
/// the field has a sub-selection, everything else (including `null`) is a leaf.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonClassifier;

impl TypeClassifier for JsonClassifier {
  fn classify(&self, field: &FieldNode, value: &serde_json::Value) -> Shape {
    match value {
      serde_json::Value::Array(_) => Shape::List,
      serde_json::Value::Object(_) if field.selection.is_some() => Shape::Object,
      _ => Shape::Scalar,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  fn context(parent: serde_json::Value, field: FieldNode) -> ResolveContext {
    let path = ResponsePath::root().key(field.response_key());
    ResolveContext {
      parent: Arc::new(parent),
      field: Arc::new(field),
      path,
    }
  }

  #[tokio::test]
  async fn test_property_resolver() {
    let ctx = context(json!({ "name": "ada" }), FieldNode::new("name"));
    assert_eq!(PropertyResolver.resolve(&ctx).await.unwrap(), json!("ada"));

    let missing = context(json!({}), FieldNode::new("name"));
    assert_eq!(
      PropertyResolver.resolve(&missing).await.unwrap(),
      serde_json::Value::Null
    );

    let scalar_parent = context(json!(3), FieldNode::new("name"));
    assert_eq!(
      PropertyResolver.resolve(&scalar_parent).await.unwrap(),
      serde_json::Value::Null
    );
  }

  #[tokio::test]
  async fn test_resolver_map_dispatches_by_name() {
    let resolvers = ResolverMap::new().with(
      "greeting",
      FnResolver::new(|ctx: ResolveContext| async move {
        let name = ctx.argument("name").and_then(|v| v.as_str()).unwrap_or("world");
        Ok(json!(format!("hello {}", name)))
      }),
    );

    let greeting = context(
      json!({}),
      FieldNode::new("greeting").with_argument("name", json!("ada")),
    );
    assert_eq!(
      resolvers.resolve(&greeting).await.unwrap(),
      json!("hello ada")
    );

    let other = context(json!({ "id": 1 }), FieldNode::new("id"));
    assert_eq!(resolvers.resolve(&other).await.unwrap(), json!(1));
  }

  #[test]
  fn test_json_classifier() {
    let leaf = FieldNode::new("a");
    let composite = FieldNode::new("a").with_selection([FieldNode::new("x")]);

    assert_eq!(JsonClassifier.classify(&leaf, &json!([1])), Shape::List);
    assert_eq!(JsonClassifier.classify(&leaf, &json!({})), Shape::Scalar);
    assert_eq!(JsonClassifier.classify(&composite, &json!({})), Shape::Object);
    assert_eq!(JsonClassifier.classify(&composite, &json!(null)), Shape::Scalar);
  }
}

//! Canopy Executor
//!
//! This crate runs a planned field tree concurrently. Every field becomes a
//! task; composite fields fan out into nested selections while they run, so
//! the total number of tasks is only known once the last one finishes.
//!
//! # Architecture
//!
//! ```text
//! Executor
//! ├── new(config, resolver) - owns the dispatcher and collaborators
//! ├── operation(selection, root) -> Operation
//! └── execute(selection, root) -> ExecutionResult
//!
//! Operation
//! ├── start() - registers a guard, fans out the root selection
//! └── wait()  - awaits the CompletionBarrier, then assembles the result
//!
//! FieldTask (one per field, submitted to the TaskDispatcher)
//! └── resolve -> classify -> nested selection | list | scalar
//!     -> TaskHandle::resolve + barrier.complete()  (or fail)
//! ```
//!
//! # Usage
//!
//! ```ignore
//! use canopy_executor::{Executor, ExecutorConfig, PropertyResolver};
//!
//! let executor = Executor::new(ExecutorConfig::default(), PropertyResolver);
//! let result = executor.execute(&planned.selection, data).await?;
//! println!("{}", serde_json::to_string_pretty(&result.data)?);
//! ```

mod assemble;
mod barrier;
mod dispatcher;
mod error;
mod events;
mod executor;
mod field;
mod handle;
mod operation;
mod path;
mod resolver;
mod result;
mod selection;
mod value;

pub use assemble::{assemble_handle, assemble_object};
pub use barrier::{BarrierWait, CompletionBarrier};
pub use dispatcher::{Concurrency, TaskDispatcher};
pub use error::{ExecutionError, ResolverError};
pub use events::{ChannelNotifier, ExecutionEvent, ExecutionNotifier, NoopNotifier};
pub use executor::{Executor, ExecutorConfig};
pub use handle::{ObjectMap, PendingValue, TaskHandle, TaskState};
pub use operation::{Operation, OperationState};
pub use path::{PathSegment, ResponsePath};
pub use resolver::{
  FieldResolver, FnResolver, JsonClassifier, PropertyResolver, ResolveContext, ResolverMap, Shape,
  TypeClassifier,
};
pub use result::ExecutionResult;
pub use value::Value;

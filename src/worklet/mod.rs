//! Worker contexts and the deferred-executing functions bound to them.
//!
//! - [`WorkerContext`] is the injected capability: submit a job, run it
//!   elsewhere.
//! - [`WorkletContext`] is the bundled implementation, a named bounded
//!   thread pool, with a lazily started process-wide default instance.
//! - [`RunAsync`] binds a callback to a context; calling it returns a
//!   [`WorkletFuture`] that resolves with the callback's return value.

pub mod context;
pub mod pool;
pub mod run_async;

pub use context::{current_context_name, ContextId, ContextSelector, Job, WorkerContext, WorkerContextExt};
pub use pool::{WorkletContext, WorkletContextConfig, DEFAULT_CONTEXT_NAME};
pub use run_async::{RunAsync, WorkletFuture};

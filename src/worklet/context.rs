//! Worker context abstraction.
//!
//! A worker context is anything that can accept a boxed job and run it
//! somewhere other than the calling thread. The crate ships one
//! implementation, [`WorkletContext`](super::WorkletContext), but hosts can
//! inject their own.

use std::cell::RefCell;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::WorkletError;

use super::pool::WorkletContext;
use super::run_async::{submit, RunAsync, WorkletFuture};

/// A unit of work submitted to a worker context.
pub type Job = Box<dyn FnOnce() + Send + 'static>;

/// Unique identifier for a worker context instance.
///
/// # Examples
///
/// ```
/// use worklets::ContextId;
///
/// let id = ContextId::new();
/// assert!(!id.is_nil());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContextId(Uuid);

impl ContextId {
    /// Creates a new random context ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Returns the underlying UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }

    /// Returns true if this is a nil (all zeros) UUID.
    #[must_use]
    pub fn is_nil(&self) -> bool {
        self.0.is_nil()
    }
}

impl Default for ContextId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ContextId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A context that executes submitted jobs off the calling thread.
pub trait WorkerContext: Send + Sync {
    /// Returns the identifier of this context instance.
    fn id(&self) -> ContextId;

    /// Returns the human-readable context name.
    fn name(&self) -> &str;

    /// Queues `job` for execution.
    ///
    /// Must not block; a context that cannot accept the job returns an error.
    fn dispatch(&self, job: Job) -> Result<(), WorkletError>;
}

/// Typed submission helpers available on every [`WorkerContext`].
pub trait WorkerContextExt: WorkerContext {
    /// Runs `f` once on this context and returns its deferred result.
    fn run_async<F, R>(&self, f: F) -> WorkletFuture<R>
    where
        F: FnOnce() -> R + Send + 'static,
        R: Send + 'static,
    {
        submit(self, f)
    }
}

impl<C: WorkerContext + ?Sized> WorkerContextExt for C {}

/// Selects the context a worklet runs on.
#[derive(Clone, Default)]
pub enum ContextSelector {
    /// The process-wide default background context.
    #[default]
    Default,
    /// A specific context.
    Context(Arc<dyn WorkerContext>),
}

impl ContextSelector {
    /// Resolves the selector to a concrete context.
    #[must_use]
    pub fn resolve(&self) -> Arc<dyn WorkerContext> {
        match self {
            Self::Default => WorkletContext::default_context() as Arc<dyn WorkerContext>,
            Self::Context(context) => Arc::clone(context),
        }
    }

    /// Binds `callback` to the selected context.
    pub fn create_run_async<A, R, F>(&self, callback: F) -> RunAsync<A, R>
    where
        F: Fn(A) -> R + Send + Sync + 'static,
        A: Send + 'static,
        R: Send + 'static,
    {
        RunAsync::new(self.resolve(), callback)
    }
}

impl fmt::Debug for ContextSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Default => f.write_str("Default"),
            Self::Context(context) => f.debug_tuple("Context").field(&context.name()).finish(),
        }
    }
}

impl From<Arc<dyn WorkerContext>> for ContextSelector {
    fn from(context: Arc<dyn WorkerContext>) -> Self {
        Self::Context(context)
    }
}

impl From<Arc<WorkletContext>> for ContextSelector {
    fn from(context: Arc<WorkletContext>) -> Self {
        Self::Context(context)
    }
}

thread_local! {
    static CURRENT_CONTEXT: RefCell<Option<Arc<str>>> = const { RefCell::new(None) };
}

pub(crate) fn enter_context(name: Arc<str>) {
    CURRENT_CONTEXT.with(|current| *current.borrow_mut() = Some(name));
}

/// Returns the name of the worklet context running the calling thread.
///
/// Returns `None` on threads that are not owned by a worklet context.
#[must_use]
pub fn current_context_name() -> Option<String> {
    CURRENT_CONTEXT.with(|current| current.borrow().as_deref().map(str::to_string))
}

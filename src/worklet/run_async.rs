//! Deferred-executing functions bound to a worker context.

use std::fmt;
use std::future::Future;
use std::panic::{self, AssertUnwindSafe};
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use futures::channel::oneshot;
use tracing::{debug, warn};

use crate::error::{Failure, WorkletError};

use super::context::{ContextId, WorkerContext};

type Callback<A, R> = dyn Fn(A) -> R + Send + Sync;

/// A function that runs its callback on a worker context.
///
/// Cloning is cheap and preserves identity; see [`RunAsync::ptr_eq`].
pub struct RunAsync<A, R> {
    inner: Arc<Inner<A, R>>,
}

struct Inner<A, R> {
    context: Arc<dyn WorkerContext>,
    callback: Arc<Callback<A, R>>,
}

impl<A, R> RunAsync<A, R>
where
    A: Send + 'static,
    R: Send + 'static,
{
    /// Binds `callback` to `context`.
    pub fn new<F>(context: Arc<dyn WorkerContext>, callback: F) -> Self
    where
        F: Fn(A) -> R + Send + Sync + 'static,
    {
        Self {
            inner: Arc::new(Inner {
                context,
                callback: Arc::new(callback),
            }),
        }
    }

    /// Dispatches the callback with `args` and returns its deferred result.
    ///
    /// Callable from any thread, including the context's own workers.
    pub fn call(&self, args: A) -> WorkletFuture<R> {
        let callback = Arc::clone(&self.inner.callback);
        submit(&*self.inner.context, move || callback(args))
    }
}

impl<A, R> RunAsync<A, R> {
    /// Returns true if both handles wrap the same bound callback.
    #[must_use]
    pub fn ptr_eq(a: &Self, b: &Self) -> bool {
        Arc::ptr_eq(&a.inner, &b.inner)
    }

    /// The context this callback runs on.
    #[must_use]
    pub fn context(&self) -> &Arc<dyn WorkerContext> {
        &self.inner.context
    }

    /// Identifier of the bound context.
    #[must_use]
    pub fn context_id(&self) -> ContextId {
        self.inner.context.id()
    }
}

impl<A, R> Clone for RunAsync<A, R> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<A, R> fmt::Debug for RunAsync<A, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RunAsync")
            .field("context", &self.inner.context.name())
            .finish_non_exhaustive()
    }
}

/// Deferred result of a job dispatched to a worker context.
#[must_use = "futures do nothing unless you `.await` or poll them"]
pub struct WorkletFuture<R> {
    state: State<R>,
}

enum State<R> {
    Rejected(Option<WorkletError>),
    Waiting {
        context: String,
        rx: oneshot::Receiver<Result<R, WorkletError>>,
    },
}

impl<R> WorkletFuture<R> {
    /// Blocks the calling thread until the result is available.
    ///
    /// Calling this from a worker of the same context can deadlock when
    /// every worker is waiting.
    pub fn wait(self) -> Result<R, WorkletError> {
        futures::executor::block_on(self)
    }
}

impl<R> Unpin for WorkletFuture<R> {}

impl<R> Future for WorkletFuture<R> {
    type Output = Result<R, WorkletError>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match &mut self.get_mut().state {
            State::Rejected(err) => {
                Poll::Ready(Err(err.take().expect("WorkletFuture polled after completion")))
            }
            State::Waiting { context, rx } => match Pin::new(rx).poll(cx) {
                Poll::Ready(Ok(result)) => Poll::Ready(result),
                Poll::Ready(Err(oneshot::Canceled)) => Poll::Ready(Err(WorkletError::Disconnected {
                    context: context.clone(),
                })),
                Poll::Pending => Poll::Pending,
            },
        }
    }
}

impl<R> fmt::Debug for WorkletFuture<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.state {
            State::Rejected(err) => f.debug_tuple("Rejected").field(err).finish(),
            State::Waiting { context, .. } => f.debug_struct("Waiting").field("context", context).finish(),
        }
    }
}

/// Queues `f` on `context`, catching panics on the worker side.
///
/// A dispatch failure is reported through the returned future.
pub(crate) fn submit<C, F, R>(context: &C, f: F) -> WorkletFuture<R>
where
    C: WorkerContext + ?Sized,
    F: FnOnce() -> R + Send + 'static,
    R: Send + 'static,
{
    let (tx, rx) = oneshot::channel::<Result<R, WorkletError>>();
    let name = context.name().to_string();

    let job_context = name.clone();
    let job = Box::new(move || {
        let result = panic::catch_unwind(AssertUnwindSafe(f)).map_err(|payload| {
            let failure = Failure::from_panic(payload);
            warn!(context = %job_context, error = %failure, "worklet panicked");
            WorkletError::Panicked {
                context: job_context,
                failure,
            }
        });
        // The caller may have dropped the future; the result is discarded.
        let _ = tx.send(result);
    });

    let state = match context.dispatch(job) {
        Ok(()) => State::Waiting { context: name, rx },
        Err(err) => {
            debug!(context = %name, error = %err, "worklet dispatch rejected");
            State::Rejected(Some(err))
        }
    };
    WorkletFuture { state }
}

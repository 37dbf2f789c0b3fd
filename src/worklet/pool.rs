//! Thread-backed worklet contexts.
//!
//! A `WorkletContext` owns a small, bounded pool of named worker threads.
//! Jobs are queued with non-blocking `try_send`, so a saturated context
//! reports backpressure instead of stalling the caller.

use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, JoinHandle};

use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};

use crate::error::{Failure, WorkletError};

use super::context::{enter_context, ContextId, Job, WorkerContext};

/// Name of the process-wide default context.
pub const DEFAULT_CONTEXT_NAME: &str = "default";

static DEFAULT_CONTEXT: OnceCell<Arc<WorkletContext>> = OnceCell::new();

/// Worklet context configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkletContextConfig {
    /// Number of worker threads.
    pub workers: usize,
    /// Maximum queued jobs.
    pub queue_capacity: usize,
}

impl Default for WorkletContextConfig {
    fn default() -> Self {
        Self {
            workers: 2,
            queue_capacity: 1024,
        }
    }
}

/// A named worker context backed by a bounded thread pool.
///
/// Dropping the last `Arc` runs [`shutdown`](Self::shutdown), which blocks
/// until every queued job has run and the workers have exited. Do not drop
/// the last handle on an async executor thread; call `shutdown` from a
/// blocking thread (for example `spawn_blocking`) first.
pub struct WorkletContext {
    id: ContextId,
    name: Arc<str>,
    queue_capacity: usize,
    tx: Mutex<Option<Sender<Job>>>,
    workers: Mutex<Vec<JoinHandle<()>>>,
}

impl WorkletContext {
    /// Starts a context with the given name and configuration.
    ///
    /// Worker threads are named `worklet-{name}-{idx}`.
    pub fn new(name: impl Into<String>, config: WorkletContextConfig) -> Self {
        let name: Arc<str> = Arc::from(name.into());
        let workers = config.workers.max(1);
        let queue_capacity = config.queue_capacity.max(1);
        let (tx, rx) = bounded::<Job>(queue_capacity);

        let mut handles = Vec::with_capacity(workers);
        for idx in 0..workers {
            let rx: Receiver<Job> = rx.clone();
            let thread_name = format!("worklet-{name}-{idx}");
            let context_name = Arc::clone(&name);
            let handle = thread::Builder::new()
                .name(thread_name)
                .spawn(move || worker_loop(&context_name, &rx))
                .expect("failed to spawn worklet worker");
            handles.push(handle);
        }

        debug!(context = %name, workers, queue_capacity, "worklet context started");

        Self {
            id: ContextId::new(),
            name,
            queue_capacity,
            tx: Mutex::new(Some(tx)),
            workers: Mutex::new(handles),
        }
    }

    /// Returns the process-wide default context, starting it on first use.
    pub fn default_context() -> Arc<Self> {
        let context = DEFAULT_CONTEXT.get_or_init(|| {
            Arc::new(Self::new(DEFAULT_CONTEXT_NAME, WorkletContextConfig::default()))
        });
        Arc::clone(context)
    }

    /// Maximum number of queued jobs.
    #[must_use]
    pub const fn queue_capacity(&self) -> usize {
        self.queue_capacity
    }

    /// Returns true once the context stopped accepting jobs.
    #[must_use]
    pub fn is_shut_down(&self) -> bool {
        self.tx.lock().unwrap_or_else(PoisonError::into_inner).is_none()
    }

    /// Stops accepting jobs, drains the queue and joins the workers.
    ///
    /// Idempotent. When called from one of this context's own workers, that
    /// worker is left to exit on its own.
    pub fn shutdown(&self) {
        let tx = self.tx.lock().unwrap_or_else(PoisonError::into_inner).take();
        if tx.is_none() {
            return;
        }
        // Closing the channel lets workers drain queued jobs then exit.
        drop(tx);

        let handles: Vec<_> = self
            .workers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .drain(..)
            .collect();
        let current = thread::current().id();
        for handle in handles {
            if handle.thread().id() == current {
                continue;
            }
            let _ = handle.join();
        }

        debug!(context = %self.name, "worklet context shut down");
    }
}

impl WorkerContext for WorkletContext {
    fn id(&self) -> ContextId {
        self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn dispatch(&self, job: Job) -> Result<(), WorkletError> {
        let tx = self
            .tx
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
            .ok_or_else(|| WorkletError::Disconnected {
                context: self.name.to_string(),
            })?;

        match tx.try_send(job) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(_)) => Err(WorkletError::QueueFull {
                context: self.name.to_string(),
                capacity: self.queue_capacity,
            }),
            Err(TrySendError::Disconnected(_)) => Err(WorkletError::Disconnected {
                context: self.name.to_string(),
            }),
        }
    }
}

impl fmt::Debug for WorkletContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WorkletContext")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("queue_capacity", &self.queue_capacity)
            .field("shut_down", &self.is_shut_down())
            .finish()
    }
}

// Blocks until the queue drains.
impl Drop for WorkletContext {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn worker_loop(name: &Arc<str>, rx: &Receiver<Job>) {
    enter_context(Arc::clone(name));
    while let Ok(job) = rx.recv() {
        if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(job)) {
            let failure = Failure::from_panic(payload);
            warn!(context = %name, error = %failure, "worklet job panicked");
        }
    }
    trace!(context = %name, "worklet worker exiting");
}

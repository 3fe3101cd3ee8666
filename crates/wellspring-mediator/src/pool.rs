//! Bounded worker pool for blocking invocations.
//!
//! The pool is a shared, externally owned resource: callers create one (or
//! clone an existing handle) and pass it to every mediator whose method is
//! marked blocking. Admission is bounded by a semaphore; when all permits
//! are taken, a new invocation waits, which propagates backpressure to the
//! puller instead of queueing unboundedly.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use thiserror::Error;
use tokio::runtime::Handle;
use tokio::sync::Semaphore;
use tokio::task::{JoinError, JoinHandle};
use tracing::debug;

/// Default bound on concurrently running blocking invocations.
pub const DEFAULT_MAX_IN_FLIGHT: usize = 8;

/// Failure to run a task on the pool.
#[derive(Debug, Error)]
pub enum PoolError {
    /// The pool was shut down.
    #[error("Worker pool is closed")]
    Closed,

    /// The spawned task did not run to completion.
    #[error("Worker task failed: {0}")]
    Join(#[from] JoinError),
}

/// A bounded handle onto the runtime's blocking thread pool.
#[derive(Clone)]
pub struct WorkerPool {
    handle: Handle,
    permits: Arc<Semaphore>,
    max_in_flight: usize,
}

impl WorkerPool {
    /// Create a pool bound to the current runtime.
    ///
    /// # Panics
    ///
    /// Panics when called outside a tokio runtime.
    #[must_use]
    pub fn new(max_in_flight: usize) -> Self {
        Self::with_handle(Handle::current(), max_in_flight)
    }

    /// Create a pool bound to an explicit runtime handle.
    #[must_use]
    pub fn with_handle(handle: Handle, max_in_flight: usize) -> Self {
        debug!(max_in_flight, "Creating worker pool");
        Self {
            handle,
            permits: Arc::new(Semaphore::new(max_in_flight)),
            max_in_flight,
        }
    }

    /// The bound on concurrently running invocations.
    #[must_use]
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight
    }

    /// Currently available permits.
    #[must_use]
    pub fn available(&self) -> usize {
        self.permits.available_permits()
    }

    /// Run `work` on the blocking pool, waiting for a permit first.
    ///
    /// The returned future is detached from `self`; dropping it releases
    /// the permit and aborts the task if it has not started running.
    pub fn run<R, F>(&self, work: F) -> impl Future<Output = Result<R, PoolError>> + Send + 'static
    where
        F: FnOnce() -> R + Send + 'static,
        R: Send + 'static,
    {
        let permits = self.permits.clone();
        let handle = self.handle.clone();

        async move {
            let _permit = permits
                .acquire_owned()
                .await
                .map_err(|_| PoolError::Closed)?;
            let task = AbortOnDrop(handle.spawn_blocking(work));
            Ok(task.await?)
        }
    }

    /// Shut the pool down; pending and future acquisitions fail with
    /// [`PoolError::Closed`]. Tasks already running are unaffected.
    pub fn close(&self) {
        self.permits.close();
    }
}

impl Default for WorkerPool {
    /// A pool on the current runtime with [`DEFAULT_MAX_IN_FLIGHT`] permits.
    fn default() -> Self {
        Self::new(DEFAULT_MAX_IN_FLIGHT)
    }
}

/// Join handle that aborts its task when dropped, so cancelling a pull
/// cancels work that has not started yet.
struct AbortOnDrop<T>(JoinHandle<T>);

impl<T> Future for AbortOnDrop<T> {
    type Output = Result<T, JoinError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.0).poll(cx)
    }
}

impl<T> Drop for AbortOnDrop<T> {
    fn drop(&mut self) {
        self.0.abort();
    }
}

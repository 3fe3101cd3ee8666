//! Eager single-result asynchronous handle.
//!
//! A [`Completion`] represents work that is already underway: it resolves
//! exactly once, whether or not anyone is awaiting it. It differs from a
//! plain future only in API surface; the mediator treats both the same way
//! (strictly sequential, one outstanding handle at a time).

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use thiserror::Error;
use tokio::sync::oneshot;

use crate::error::BoxError;

/// The producer side of a [`Completion`] was dropped before resolving.
#[derive(Debug, Error)]
#[error("Completion handle was dropped before resolving")]
pub struct CompletionDropped;

enum Inner<T> {
    Ready(Option<Result<T, BoxError>>),
    Pending(oneshot::Receiver<Result<T, BoxError>>),
}

/// A single-result handle that is already resolving.
pub struct Completion<T> {
    inner: Inner<T>,
}

impl<T: Send + 'static> Completion<T> {
    /// Spawn `work` on the current runtime and return a handle to its
    /// result. The work starts immediately.
    #[must_use]
    pub fn spawn<F>(work: F) -> Self
    where
        F: Future<Output = Result<T, BoxError>> + Send + 'static,
    {
        let (tx, rx) = oneshot::channel();
        tokio::spawn(async move {
            // The receiver may be gone; the result is then discarded.
            let _ = tx.send(work.await);
        });
        Self {
            inner: Inner::Pending(rx),
        }
    }
}

impl<T> Completion<T> {
    /// A handle that is already resolved with `value`.
    #[must_use]
    pub fn ready(value: T) -> Self {
        Self {
            inner: Inner::Ready(Some(Ok(value))),
        }
    }

    /// A handle that is already resolved with a failure.
    #[must_use]
    pub fn failed(err: impl Into<BoxError>) -> Self {
        Self {
            inner: Inner::Ready(Some(Err(err.into()))),
        }
    }

    /// Adopt an existing oneshot receiver as a completion handle.
    #[must_use]
    pub fn from_oneshot(rx: oneshot::Receiver<Result<T, BoxError>>) -> Self {
        Self {
            inner: Inner::Pending(rx),
        }
    }
}

impl<T> Unpin for Completion<T> {}

impl<T> Future for Completion<T> {
    type Output = Result<T, BoxError>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match &mut self.get_mut().inner {
            Inner::Ready(slot) => {
                let result = slot.take().expect("Completion polled after resolution");
                Poll::Ready(result)
            }
            Inner::Pending(rx) => match Pin::new(rx).poll(cx) {
                Poll::Pending => Poll::Pending,
                Poll::Ready(Ok(result)) => Poll::Ready(result),
                Poll::Ready(Err(_)) => Poll::Ready(Err(Box::new(CompletionDropped))),
            },
        }
    }
}

//! Bounded concurrent merge.
//!
//! [`BoundedMerge`] drives a stream of futures with a fixed in-flight
//! window. In [`MergeMode::Ordered`] completions are re-sequenced into
//! submission order before release (pipelined execution, call-order
//! emission); in [`MergeMode::Unordered`] completions are released as they
//! happen. The first failed future terminates the merge: in-flight futures
//! are dropped and the source is not pulled again.
//!
//! The combinator is independent of shape classification and reused by
//! every pooled production path.

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use futures_util::stream::{FuturesOrdered, FuturesUnordered};
use futures_util::Stream;

/// Emission discipline for concurrently running futures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeMode {
    /// Release results in submission order.
    Ordered,
    /// Release results in completion order.
    Unordered,
}

enum Window<F: Future> {
    Ordered(FuturesOrdered<F>),
    Unordered(FuturesUnordered<F>),
}

impl<F: Future> Window<F> {
    fn new(mode: MergeMode) -> Self {
        match mode {
            MergeMode::Ordered => Self::Ordered(FuturesOrdered::new()),
            MergeMode::Unordered => Self::Unordered(FuturesUnordered::new()),
        }
    }

    fn len(&self) -> usize {
        match self {
            Self::Ordered(q) => q.len(),
            Self::Unordered(q) => q.len(),
        }
    }

    fn push(&mut self, fut: F) {
        match self {
            Self::Ordered(q) => q.push_back(fut),
            Self::Unordered(q) => q.push(fut),
        }
    }

    fn poll_next(&mut self, cx: &mut Context<'_>) -> Poll<Option<F::Output>> {
        match self {
            Self::Ordered(q) => Pin::new(q).poll_next(cx),
            Self::Unordered(q) => Pin::new(q).poll_next(cx),
        }
    }
}

/// A stream of results driven from a stream of futures with a bounded
/// in-flight window.
pub struct BoundedMerge<S, F>
where
    F: Future,
{
    source: Option<S>,
    window: Window<F>,
    capacity: usize,
    mode: MergeMode,
    terminated: bool,
}

/// Merge `source` with at most `capacity` futures in flight.
///
/// A capacity of zero is treated as one.
pub fn bounded_merge<S, F, T, E>(source: S, capacity: usize, mode: MergeMode) -> BoundedMerge<S, F>
where
    S: Stream<Item = F> + Unpin,
    F: Future<Output = Result<T, E>>,
{
    BoundedMerge {
        source: Some(source),
        window: Window::new(mode),
        capacity: capacity.max(1),
        mode,
        terminated: false,
    }
}

impl<S, F, T, E> Stream for BoundedMerge<S, F>
where
    S: Stream<Item = F> + Unpin,
    F: Future<Output = Result<T, E>>,
{
    type Item = Result<T, E>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();

        if this.terminated {
            return Poll::Ready(None);
        }

        // Refill the window before draining, so submissions overlap.
        while this.window.len() < this.capacity {
            match &mut this.source {
                None => break,
                Some(source) => match Pin::new(source).poll_next(cx) {
                    Poll::Ready(Some(fut)) => this.window.push(fut),
                    Poll::Ready(None) => {
                        this.source = None;
                        break;
                    }
                    Poll::Pending => break,
                },
            }
        }

        match this.window.poll_next(cx) {
            Poll::Ready(Some(Ok(item))) => Poll::Ready(Some(Ok(item))),
            Poll::Ready(Some(Err(err))) => {
                // First failure is terminal: drop in-flight work, stop
                // pulling the source.
                this.terminated = true;
                this.source = None;
                this.window = Window::new(this.mode);
                Poll::Ready(Some(Err(err)))
            }
            Poll::Ready(None) => {
                if this.source.is_none() {
                    Poll::Ready(None)
                } else {
                    // Window empty but the source is still pending.
                    Poll::Pending
                }
            }
            Poll::Pending => Poll::Pending,
        }
    }
}

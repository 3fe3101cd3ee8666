//! Pull-driven generator.
//!
//! [`Generate`] turns "call the producer again" into a stream: each
//! downstream poll starts exactly one invocation and suspends until it
//! resolves. The state machine is explicit (`Idle -> Pending -> Idle ...`,
//! `Done` after the first failure) so backpressure and cancellation points
//! are visible: nothing runs between polls, and dropping the stream drops
//! the in-flight future.
//!
//! The sequence is infinite by construction; it only terminates through the
//! error channel.

use std::pin::Pin;
use std::task::{Context, Poll};

use futures_util::future::BoxFuture;
use futures_util::Stream;

use wellspring_core::ProduceError;

enum State<R> {
    /// No invocation outstanding.
    Idle,
    /// One invocation outstanding.
    Pending(BoxFuture<'static, Result<R, ProduceError>>),
    /// Terminal; a failure was emitted.
    Done,
}

/// An infinite stream producing one item per invocation of `next`.
pub struct Generate<F, R> {
    next: F,
    state: State<R>,
}

/// Create a generator over an invocation factory. `next` is called once
/// per downstream pull; its future is awaited before the next pull starts,
/// so at most one invocation is outstanding.
pub fn generate<F, R>(next: F) -> Generate<F, R>
where
    F: FnMut() -> BoxFuture<'static, Result<R, ProduceError>> + Send + Unpin,
{
    Generate {
        next,
        state: State::Idle,
    }
}

impl<F, R> Stream for Generate<F, R>
where
    F: FnMut() -> BoxFuture<'static, Result<R, ProduceError>> + Send + Unpin,
{
    type Item = Result<R, ProduceError>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        loop {
            match &mut this.state {
                State::Done => return Poll::Ready(None),
                State::Idle => {
                    let fut = (this.next)();
                    this.state = State::Pending(fut);
                }
                State::Pending(fut) => match fut.as_mut().poll(cx) {
                    Poll::Pending => return Poll::Pending,
                    Poll::Ready(Ok(item)) => {
                        this.state = State::Idle;
                        return Poll::Ready(Some(Ok(item)));
                    }
                    Poll::Ready(Err(err)) => {
                        this.state = State::Done;
                        return Poll::Ready(Some(Err(err)));
                    }
                },
            }
        }
    }
}

//! Decoration hook.
//!
//! Every finished sequence is passed through a [`SequenceDecorator`] before
//! it becomes the outward stream. Callers use this to attach cross-cutting
//! behavior (observability, retries, timeouts) without the sequence builder
//! knowing about it; the mediator itself applies the identity by default.

use wellspring_core::OutwardStream;

/// A transform over the finished sequence, applied exactly once.
pub trait SequenceDecorator<T>: Send {
    /// Wrap the sequence. Must be transparent to item content unless the
    /// decorator deliberately transforms it.
    fn decorate(&self, stream: OutwardStream<T>) -> OutwardStream<T>;
}

impl<T, F> SequenceDecorator<T> for F
where
    F: Fn(OutwardStream<T>) -> OutwardStream<T> + Send,
{
    fn decorate(&self, stream: OutwardStream<T>) -> OutwardStream<T> {
        self(stream)
    }
}

/// The identity decoration, installed by default.
pub fn identity<T>() -> impl SequenceDecorator<T> + 'static {
    |stream: OutwardStream<T>| stream
}

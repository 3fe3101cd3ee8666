//! Message envelope for Wellspring.
//!
//! A [`Message`] wraps a payload together with optional acknowledgment and
//! failure callbacks. The mediator passes the callbacks through untouched;
//! they are settled by whichever downstream stage consumes the message.

use std::fmt;
use std::sync::Arc;

use futures_util::future::BoxFuture;

use crate::error::BoxError;

/// Acknowledgment callback, resolved when the message has been handled.
pub type AckFn = Arc<dyn Fn() -> BoxFuture<'static, ()> + Send + Sync>;

/// Negative-acknowledgment callback, carrying the failure reason.
pub type NackFn = Arc<dyn Fn(BoxError) -> BoxFuture<'static, ()> + Send + Sync>;

/// An immutable envelope around a payload of type `T`.
///
/// A bare payload is wrapped into a default envelope (no callbacks) with
/// [`Message::of`] before it leaves the mediator.
pub struct Message<T> {
    /// The payload carried by this message.
    payload: T,
    /// Acknowledgment callback, if any.
    ack: Option<AckFn>,
    /// Failure callback, if any.
    nack: Option<NackFn>,
}

impl<T> Message<T> {
    /// Wrap a payload into a default envelope with no callbacks.
    #[must_use]
    pub fn of(payload: T) -> Self {
        Self {
            payload,
            ack: None,
            nack: None,
        }
    }

    /// Attach an acknowledgment callback.
    #[must_use]
    pub fn with_ack<F>(mut self, ack: F) -> Self
    where
        F: Fn() -> BoxFuture<'static, ()> + Send + Sync + 'static,
    {
        self.ack = Some(Arc::new(ack));
        self
    }

    /// Attach a failure callback.
    #[must_use]
    pub fn with_nack<F>(mut self, nack: F) -> Self
    where
        F: Fn(BoxError) -> BoxFuture<'static, ()> + Send + Sync + 'static,
    {
        self.nack = Some(Arc::new(nack));
        self
    }

    /// Get a reference to the payload.
    #[must_use]
    pub fn payload(&self) -> &T {
        &self.payload
    }

    /// Consume the envelope, returning the payload.
    #[must_use]
    pub fn into_payload(self) -> T {
        self.payload
    }

    /// Whether an acknowledgment callback is attached.
    #[must_use]
    pub fn has_ack(&self) -> bool {
        self.ack.is_some()
    }

    /// Whether a failure callback is attached.
    #[must_use]
    pub fn has_nack(&self) -> bool {
        self.nack.is_some()
    }

    /// Acknowledge the message. A no-op when no callback is attached.
    pub async fn ack(&self) {
        if let Some(ack) = &self.ack {
            ack().await;
        }
    }

    /// Report a processing failure for this message. A no-op when no
    /// callback is attached.
    pub async fn nack(&self, reason: BoxError) {
        if let Some(nack) = &self.nack {
            nack(reason).await;
        }
    }

    /// Replace the payload, keeping the callbacks.
    #[must_use]
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Message<U> {
        Message {
            payload: f(self.payload),
            ack: self.ack,
            nack: self.nack,
        }
    }
}

impl<T: Clone> Clone for Message<T> {
    fn clone(&self) -> Self {
        Self {
            payload: self.payload.clone(),
            ack: self.ack.clone(),
            nack: self.nack.clone(),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Message<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Message")
            .field("payload", &self.payload)
            .field("ack", &self.ack.is_some())
            .field("nack", &self.nack.is_some())
            .finish()
    }
}

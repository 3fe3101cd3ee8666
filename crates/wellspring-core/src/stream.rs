//! Stream type aliases shared between producers and the mediator.

use futures_util::stream::BoxStream;

use crate::error::{BoxError, ProduceError};
use crate::message::Message;

/// A user-returned stream of bare payloads.
pub type PayloadStream<T> = BoxStream<'static, Result<T, BoxError>>;

/// A user-returned stream of ready-made messages.
pub type MessageStream<T> = BoxStream<'static, Result<Message<T>, BoxError>>;

/// The single externally visible artifact: a lazy, pull-driven stream of
/// envelopes. The first `Err` item is terminal; the mediator never emits
/// past it.
pub type OutwardStream<T> = BoxStream<'static, Result<Message<T>, ProduceError>>;

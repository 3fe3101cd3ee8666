//! Invocation adapter.
//!
//! A [`Producer`] is the shape-typed callable bound to a bean instance by
//! the lifecycle layer. The adapter exposes two primitives over it: an
//! inline call on the current async context, and a pooled call for blocking
//! methods. Every strategy in the sequence builder goes through one of the
//! two, which keeps "where the value came from" separate from "how pulls
//! turn it into a sequence".

use std::future::Future;
use std::sync::Arc;

use futures_util::future::BoxFuture;
use tracing::warn;

use wellspring_core::{
    BoxError, Completion, Message, MessageStream, PayloadStream, ProduceError, ProductionKind,
    StreamBuilder,
};

use crate::pool::{PoolError, WorkerPool};

/// A repeatedly callable individual-value producer. `Ok(None)` models a
/// null return; `Err` models a failure thrown by user code.
pub type ProducerFn<R> = Arc<dyn Fn() -> Result<Option<R>, BoxError> + Send + Sync>;

/// The user-supplied producer callable, one variant per recognized shape.
///
/// Stream and builder variants are invoked exactly once; the remaining
/// variants are invoked once per downstream pull.
pub enum Producer<T> {
    /// Returns a stream of ready-made messages.
    StreamOfMessages(Box<dyn FnOnce() -> MessageStream<T> + Send>),
    /// Returns a stream of bare payloads.
    StreamOfPayloads(Box<dyn FnOnce() -> PayloadStream<T> + Send>),
    /// Returns a builder over ready-made messages.
    BuilderOfMessages(Box<dyn FnOnce() -> StreamBuilder<Message<T>> + Send>),
    /// Returns a builder over bare payloads.
    BuilderOfPayloads(Box<dyn FnOnce() -> StreamBuilder<T> + Send>),
    /// Returns one message per call.
    IndividualMessages(ProducerFn<Message<T>>),
    /// Returns one payload per call.
    IndividualPayloads(ProducerFn<T>),
    /// Returns one eager handle per call, resolving to a message.
    CompletionsOfMessages(Box<dyn FnMut() -> Completion<Message<T>> + Send>),
    /// Returns one eager handle per call, resolving to a payload.
    CompletionsOfPayloads(Box<dyn FnMut() -> Completion<T> + Send>),
    /// Returns one lazy future per call, resolving to a message.
    FuturesOfMessages(Box<dyn FnMut() -> BoxFuture<'static, Result<Message<T>, BoxError>> + Send>),
    /// Returns one lazy future per call, resolving to a payload.
    FuturesOfPayloads(Box<dyn FnMut() -> BoxFuture<'static, Result<T, BoxError>> + Send>),
}

impl<T> Producer<T> {
    /// The production kind this callable satisfies.
    #[must_use]
    pub fn production(&self) -> ProductionKind {
        match self {
            Self::StreamOfMessages(_) | Self::BuilderOfMessages(_) => {
                ProductionKind::StreamOfMessage
            }
            Self::StreamOfPayloads(_) | Self::BuilderOfPayloads(_) => {
                ProductionKind::StreamOfPayload
            }
            Self::IndividualMessages(_) => ProductionKind::IndividualMessage,
            Self::IndividualPayloads(_) => ProductionKind::IndividualPayload,
            Self::CompletionsOfMessages(_) => ProductionKind::CompletionOfMessage,
            Self::CompletionsOfPayloads(_) => ProductionKind::CompletionOfPayload,
            Self::FuturesOfMessages(_) => ProductionKind::FutureOfMessage,
            Self::FuturesOfPayloads(_) => ProductionKind::FutureOfPayload,
        }
    }

    /// Whether the callable returns the builder-style surface.
    #[must_use]
    pub fn uses_builder_types(&self) -> bool {
        matches!(self, Self::BuilderOfMessages(_) | Self::BuilderOfPayloads(_))
    }
}

/// Inline invocation on the current async context. A null result is a
/// per-item fatal failure attributed to `method`.
pub(crate) fn invoke<R>(method: &Arc<str>, producer: &ProducerFn<R>) -> Result<R, ProduceError> {
    match producer() {
        Ok(Some(value)) => Ok(value),
        Ok(None) => Err(ProduceError::NullResult {
            method: method.to_string(),
        }),
        Err(source) => {
            warn!(method = %method, error = %source, "User code failed");
            Err(ProduceError::UserCode {
                method: method.to_string(),
                source,
            })
        }
    }
}

/// Pooled invocation. Submits the call to the worker pool and resolves with
/// the result, enforcing the same non-null postcondition as [`invoke`].
///
/// A panic inside user code surfaces as a user-code failure; pool shutdown
/// or task cancellation surfaces as a pool failure. Dropping the returned
/// future withdraws the submission.
pub(crate) fn invoke_blocking<R: Send + 'static>(
    method: Arc<str>,
    producer: ProducerFn<R>,
    pool: &WorkerPool,
) -> impl Future<Output = Result<R, ProduceError>> + Send + 'static {
    let submission = pool.run(move || producer());

    async move {
        match submission.await {
            Ok(Ok(Some(value))) => Ok(value),
            Ok(Ok(None)) => Err(ProduceError::NullResult {
                method: method.to_string(),
            }),
            Ok(Err(source)) => {
                warn!(method = %method, error = %source, "User code failed");
                Err(ProduceError::UserCode {
                    method: method.to_string(),
                    source,
                })
            }
            Err(PoolError::Join(join)) if join.is_panic() => Err(ProduceError::UserCode {
                method: method.to_string(),
                source: Box::new(join),
            }),
            Err(pool_err) => {
                warn!(method = %method, error = %pool_err, "Worker pool submission failed");
                Err(ProduceError::Pool {
                    method: method.to_string(),
                    source: Box::new(pool_err),
                })
            }
        }
    }
}

//! Error taxonomy for the mediator.
//!
//! Three distinct families:
//!
//! - [`ConfigurationError`] - fatal, surfaced when the mediator is built or
//!   initialized; the outward stream is never created.
//! - [`ProduceError`] - carried on the outward stream's error channel; the
//!   first one is terminal for the sequence.
//! - [`MediatorError`] - misuse of the mediator surface itself.

use thiserror::Error;

use crate::config::{ProductionKind, Shape};

/// Boxed error type used for user-code failures and callbacks.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Fatal configuration problems, detected before any item is produced.
#[derive(Debug, Error)]
pub enum ConfigurationError {
    /// The configuration describes a non-publisher method.
    #[error("Expected a publisher shape, found {0:?}")]
    UnexpectedShape(Shape),

    /// The production kind cannot be handled by a publisher mediator.
    #[error("Unsupported production kind {production:?} for method `{method}`")]
    UnsupportedProduction {
        /// The offending method.
        method: String,
        /// The unsupported kind.
        production: ProductionKind,
    },

    /// The supplied producer callable does not match the configured kind.
    #[error("Producer for `{method}` does not match configured production kind {expected:?}")]
    ProducerMismatch {
        /// The offending method.
        method: String,
        /// The kind the configuration declares.
        expected: ProductionKind,
    },
}

/// Per-item failures carried on the outward stream. Terminal: stream
/// semantics end the sequence at the first error.
#[derive(Debug, Error)]
pub enum ProduceError {
    /// An individual-value method returned no result.
    #[error("Method `{method}` returned a null result")]
    NullResult {
        /// The offending method.
        method: String,
    },

    /// User code raised a failure; propagated unchanged.
    #[error("User code failure in `{method}`: {source}")]
    UserCode {
        /// The offending method.
        method: String,
        /// The underlying failure.
        #[source]
        source: BoxError,
    },

    /// The worker pool could not run the invocation.
    #[error("Worker pool failed to run `{method}`: {source}")]
    Pool {
        /// The offending method.
        method: String,
        /// The underlying failure.
        #[source]
        source: BoxError,
    },
}

impl ProduceError {
    /// The method this failure is attributed to.
    #[must_use]
    pub fn method(&self) -> &str {
        match self {
            Self::NullResult { method }
            | Self::UserCode { method, .. }
            | Self::Pool { method, .. } => method,
        }
    }
}

/// Misuse of the mediator surface.
#[derive(Debug, Error)]
pub enum MediatorError {
    /// Construction-time configuration failure.
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    /// `stream()` was called before `initialize()`.
    #[error("Mediator is not initialized")]
    NotInitialized,

    /// `initialize()` was called more than once.
    #[error("Mediator is already initialized")]
    AlreadyInitialized,

    /// The outward stream was already handed to a consumer.
    #[error("Outward stream was already taken")]
    StreamAlreadyTaken,
}

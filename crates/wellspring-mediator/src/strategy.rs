//! Shape classification.
//!
//! The classifier runs exactly once, when the mediator is constructed, and
//! maps the immutable configuration to one production strategy. Unsupported
//! combinations fail here, never on first pull, so misconfiguration surfaces
//! before any traffic flows.

use wellspring_core::{ConfigurationError, MediatorConfiguration, ProductionKind, Shape};

/// Emission policy for pooled blocking invocations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockingPolicy {
    /// Results are re-sequenced into call order before emission.
    Ordered,
    /// Results are emitted as they complete.
    Unordered,
}

/// One production strategy, selected per mediator instance and fixed for
/// its lifetime. Behavior is carried as explicit fields rather than
/// rediscovered from the configuration on every pull.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// Pass through a user-returned stream of messages.
    StreamOfMessages {
        /// Unwrap a builder surface first.
        unwrap_builder: bool,
    },
    /// Wrap each item of a user-returned payload stream.
    StreamOfPayloads {
        /// Unwrap a builder surface first.
        unwrap_builder: bool,
    },
    /// One message per pull.
    IndividualMessages {
        /// Pool offload policy; `None` runs inline on the async context.
        offload: Option<BlockingPolicy>,
    },
    /// One payload per pull, wrapped into a default envelope.
    IndividualPayloads {
        /// Pool offload policy; `None` runs inline on the async context.
        offload: Option<BlockingPolicy>,
    },
    /// One eager async handle per pull, resolving to a message.
    CompletionsOfMessages,
    /// One eager async handle per pull, resolving to a payload.
    CompletionsOfPayloads,
    /// One lazy future per pull, resolving to a message.
    FuturesOfMessages,
    /// One lazy future per pull, resolving to a payload.
    FuturesOfPayloads,
}

impl Strategy {
    /// Select the strategy for `config`.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigurationError`] for non-publisher shapes and for
    /// production kinds no publisher method can declare.
    pub fn select(config: &MediatorConfiguration) -> Result<Self, ConfigurationError> {
        if config.shape() != Shape::Publisher {
            return Err(ConfigurationError::UnexpectedShape(config.shape()));
        }

        let strategy = match config.production() {
            ProductionKind::StreamOfMessage => Self::StreamOfMessages {
                unwrap_builder: config.uses_builder_types(),
            },
            ProductionKind::StreamOfPayload => Self::StreamOfPayloads {
                unwrap_builder: config.uses_builder_types(),
            },
            ProductionKind::IndividualMessage => Self::IndividualMessages {
                offload: offload_policy(config),
            },
            ProductionKind::IndividualPayload => Self::IndividualPayloads {
                offload: offload_policy(config),
            },
            ProductionKind::CompletionOfMessage => Self::CompletionsOfMessages,
            ProductionKind::CompletionOfPayload => Self::CompletionsOfPayloads,
            ProductionKind::FutureOfMessage => Self::FuturesOfMessages,
            ProductionKind::FutureOfPayload => Self::FuturesOfPayloads,
            ProductionKind::None => {
                return Err(ConfigurationError::UnsupportedProduction {
                    method: config.method().to_string(),
                    production: config.production(),
                })
            }
        };

        Ok(strategy)
    }
}

fn offload_policy(config: &MediatorConfiguration) -> Option<BlockingPolicy> {
    if !config.is_blocking() {
        return None;
    }
    if config.is_blocking_execution_ordered() {
        Some(BlockingPolicy::Ordered)
    } else {
        Some(BlockingPolicy::Unordered)
    }
}

//! Static descriptors for producer methods.
//!
//! A [`MediatorConfiguration`] is resolved by the lifecycle layer before a
//! mediator is constructed and never changes afterwards. The mediator only
//! reads it.

/// The general category of a mediated method.
///
/// Only [`Shape::Publisher`] methods produce an outward stream; the other
/// shapes are handled by different mediator types and are rejected here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    /// Produces messages (no inbound channel).
    Publisher,
    /// Consumes and produces messages.
    Processor,
    /// Consumes messages (no outbound channel).
    Subscriber,
    /// Transforms a whole stream rather than individual items.
    StreamTransformer,
}

/// What a single invocation of the producer method returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProductionKind {
    /// A stream of ready-made messages, invoked once.
    StreamOfMessage,
    /// A stream of bare payloads, invoked once.
    StreamOfPayload,
    /// One bare payload per invocation.
    IndividualPayload,
    /// One ready-made message per invocation.
    IndividualMessage,
    /// One eager async handle resolving to a message per invocation.
    CompletionOfMessage,
    /// One eager async handle resolving to a payload per invocation.
    CompletionOfPayload,
    /// One lazy future resolving to a message per invocation.
    FutureOfMessage,
    /// One lazy future resolving to a payload per invocation.
    FutureOfPayload,
    /// The method produces nothing (subscriber side).
    None,
}

/// Immutable descriptor of one producer method.
#[derive(Debug, Clone)]
pub struct MediatorConfiguration {
    /// Human-readable method name, used in diagnostics.
    method: String,
    /// General shape of the method.
    shape: Shape,
    /// What one invocation returns.
    production: ProductionKind,
    /// Whether the method returns the builder-style stream surface.
    uses_builder_types: bool,
    /// Whether invocations must run on the worker pool.
    blocking: bool,
    /// Whether pooled invocations must emit in call order.
    blocking_execution_ordered: bool,
}

impl MediatorConfiguration {
    /// Create a descriptor for a publisher method.
    #[must_use]
    pub fn new(method: impl Into<String>, shape: Shape, production: ProductionKind) -> Self {
        Self {
            method: method.into(),
            shape,
            production,
            uses_builder_types: false,
            blocking: false,
            blocking_execution_ordered: true,
        }
    }

    /// Mark the method as returning builder-style stream types.
    #[must_use]
    pub fn with_builder_types(mut self) -> Self {
        self.uses_builder_types = true;
        self
    }

    /// Mark the method as blocking. Ordered emission by default.
    #[must_use]
    pub fn with_blocking(mut self, ordered: bool) -> Self {
        self.blocking = true;
        self.blocking_execution_ordered = ordered;
        self
    }

    /// The diagnostic method name.
    #[must_use]
    pub fn method(&self) -> &str {
        &self.method
    }

    /// The general shape of the method.
    #[must_use]
    pub fn shape(&self) -> Shape {
        self.shape
    }

    /// What one invocation returns.
    #[must_use]
    pub fn production(&self) -> ProductionKind {
        self.production
    }

    /// Whether the method returns builder-style stream types.
    #[must_use]
    pub fn uses_builder_types(&self) -> bool {
        self.uses_builder_types
    }

    /// Whether invocations must run on the worker pool.
    #[must_use]
    pub fn is_blocking(&self) -> bool {
        self.blocking
    }

    /// Whether pooled invocations must emit in call order.
    #[must_use]
    pub fn is_blocking_execution_ordered(&self) -> bool {
        self.blocking_execution_ordered
    }
}

//! # wellspring-mediator
//!
//! Shape-adapting stream mediator: binds one user-supplied producer method
//! to a uniform, lazily pulled, backpressure-respecting stream of
//! [`Message`](wellspring_core::Message) envelopes.
//!
//! Three cooperating pieces:
//!
//! - **Strategy** - classifies the method configuration into exactly one
//!   production strategy, at construction time
//! - **Producer / WorkerPool** - uniform invocation over the user callable,
//!   inline or offloaded to a bounded blocking pool
//! - **PublisherMediator** - builds the outward sequence per strategy:
//!   pass-through for stream shapes, pull generator for individual and
//!   async-handle shapes, bounded ordered/unordered merge for pooled ones
//!
//! ## Flow
//!
//! ```text
//! ┌───────────────┐     ┌───────────────────┐     ┌────────────────┐
//! │ Configuration │────▶│ PublisherMediator │────▶│ OutwardStream  │
//! └───────────────┘     └───────────────────┘     └────────────────┘
//!                               │
//!                               ▼
//!                        ┌────────────┐
//!                        │ WorkerPool │  (blocking methods only)
//!                        └────────────┘
//! ```
//!
//! Nothing runs until the outward stream is polled; dropping it cancels
//! in-flight work.

pub mod decorate;
pub mod generate;
pub mod invoke;
pub mod mediator;
pub mod merge;
pub mod pool;
pub mod strategy;

pub use decorate::{identity, SequenceDecorator};
pub use invoke::{Producer, ProducerFn};
pub use mediator::PublisherMediator;
pub use merge::{bounded_merge, BoundedMerge, MergeMode};
pub use pool::{WorkerPool, DEFAULT_MAX_IN_FLIGHT};
pub use strategy::{BlockingPolicy, Strategy};

//! # wellspring-core
//!
//! Contract types for the Wellspring stream mediator.
//!
//! This crate provides the shared vocabulary between the lifecycle layer
//! that discovers producer methods, the mediator that adapts them, and the
//! connectors that consume the resulting streams:
//!
//! - **Message** - Immutable payload envelope with acknowledgment callbacks
//! - **MediatorConfiguration** - Static descriptor of a producer method
//! - **StreamBuilder** - Builder-style stream surface
//! - **Completion** - Eager single-result asynchronous handle
//! - **Errors** - Configuration, production, and surface error taxonomy

pub mod builder;
pub mod completion;
pub mod config;
pub mod error;
pub mod message;
pub mod stream;

pub use builder::StreamBuilder;
pub use completion::{Completion, CompletionDropped};
pub use config::{MediatorConfiguration, ProductionKind, Shape};
pub use error::{BoxError, ConfigurationError, MediatorError, ProduceError};
pub use message::Message;
pub use stream::{MessageStream, OutwardStream, PayloadStream};

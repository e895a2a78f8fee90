use async_trait::async_trait;
use std::future::Future;
use std::sync::Arc;
use thiserror::Error;

use super::broker::{CodecError, TransportError};
use crate::model::DiceRollCreated;

/// Errors returned by the hubs to the caller of an operation
#[derive(Debug, Error)]
pub enum EventError {
    /// A required collaborator was missing when building a hub
    #[error("Invalid configuration: {0}")]
    Configuration(String),

    #[error("Transport error, could not {operation}: {source}")]
    Transport {
        operation: &'static str,
        #[source]
        source: TransportError,
    },

    #[error("Serialization error: {0}")]
    Serialization(#[from] CodecError),
}

impl EventError {
    pub fn configuration(msg: impl Into<String>) -> Self {
        EventError::Configuration(msg.into())
    }

    pub fn transport(operation: &'static str, source: TransportError) -> Self {
        EventError::Transport { operation, source }
    }
}

/// Error returned by a subscriber's handler. The hubs log it and carry on.
#[derive(Debug, Error)]
#[error("Handler error: {0}")]
pub struct HandlerError(pub String);

impl HandlerError {
    pub fn new(msg: impl Into<String>) -> Self {
        HandlerError(msg.into())
    }
}

/// Trait for components reacting to dice roll created events
///
/// A handler is registered once per (room, subscriber) pair and is invoked
/// once for every event delivered to that room.
#[async_trait]
pub trait DiceRollCreatedHandler: Send + Sync {
    async fn handle(&self, event: DiceRollCreated) -> Result<(), HandlerError>;

    /// Get a human-readable name for this handler (for logging/debugging)
    fn name(&self) -> &'static str {
        "anonymous"
    }
}

/// Adapts an async closure into a [`DiceRollCreatedHandler`]
pub struct HandlerFn<F> {
    f: F,
}

#[async_trait]
impl<F, Fut> DiceRollCreatedHandler for HandlerFn<F>
where
    F: Fn(DiceRollCreated) -> Fut + Send + Sync,
    Fut: Future<Output = Result<(), HandlerError>> + Send,
{
    async fn handle(&self, event: DiceRollCreated) -> Result<(), HandlerError> {
        (self.f)(event).await
    }

    fn name(&self) -> &'static str {
        "handler_fn"
    }
}

/// Builds a shareable handler from an async closure
pub fn handler_fn<F, Fut>(f: F) -> Arc<dyn DiceRollCreatedHandler>
where
    F: Fn(DiceRollCreated) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), HandlerError>> + Send + 'static,
{
    Arc::new(HandlerFn { f })
}

/// A handler that ignores every event
pub struct NoOpHandler;

#[async_trait]
impl DiceRollCreatedHandler for NoOpHandler {
    async fn handle(&self, _event: DiceRollCreated) -> Result<(), HandlerError> {
        Ok(())
    }

    fn name(&self) -> &'static str {
        "NoOpHandler"
    }
}

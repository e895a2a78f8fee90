use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::mpsc;

/// Errors reported by a publish/subscribe transport
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("Publish failed: {0}")]
    Publish(String),

    #[error("Subscribe failed: {0}")]
    Subscribe(String),

    #[error("Unsubscribe failed: {0}")]
    Unsubscribe(String),
}

/// A message delivered by the transport on a subscribed topic
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportMessage {
    pub topic: String,
    pub payload: Vec<u8>,
}

impl TransportMessage {
    pub fn new(topic: impl Into<String>, payload: Vec<u8>) -> Self {
        Self {
            topic: topic.into(),
            payload,
        }
    }
}

/// Publish/subscribe client shared by every replica of the application
#[async_trait]
pub trait Transport: Send + Sync {
    async fn publish(&self, topic: &str, payload: Vec<u8>) -> Result<(), TransportError>;

    /// Subscribes to `topic`, forwarding every message into `delivery`
    async fn channel_subscribe(
        &self,
        topic: &str,
        delivery: mpsc::Sender<TransportMessage>,
    ) -> Result<Box<dyn TransportSubscription>, TransportError>;
}

/// Handle of an active transport subscription
#[async_trait]
pub trait TransportSubscription: Send {
    async fn unsubscribe(&mut self) -> Result<(), TransportError>;
}

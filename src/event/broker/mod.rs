// Broker backed hub
//
// Every replica publishes its events on one shared topic and runs a receive
// loop that feeds the events coming from any replica into its local handlers.

pub use codec::{decode, encode, CodecError};
pub use local::LocalBroker;
pub use transport::{Transport, TransportError, TransportMessage, TransportSubscription};

mod codec;
mod local;
mod receiver;
mod transport;

use async_trait::async_trait;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::handler::{DiceRollCreatedHandler, EventError};
use super::hub::{Notifier, Subscriber};
use super::registry::HandlerRegistry;
use crate::model::DiceRollCreated;
use receiver::ReceiveLoop;

/// Topic shared by every replica for the dice roll created events of all rooms
pub const DICE_ROLL_CREATED_TOPIC: &str = "rollify.room.diceroll.create";

/// Capacity of the channel between the transport and the receive loop
pub const DEFAULT_DELIVERY_CAPACITY: usize = 15;

/// Configuration needed to build a [`BrokerHub`]
#[derive(Clone)]
pub struct BrokerHubConfig {
    /// Client of the broker shared by every replica. Required.
    pub transport: Option<Arc<dyn Transport>>,
    /// Governs the receive loop, once cancelled the hub stops receiving
    /// events and a new hub is required. Required.
    pub cancellation: Option<CancellationToken>,
    pub topic: String,
    pub delivery_capacity: usize,
}

impl Default for BrokerHubConfig {
    fn default() -> Self {
        Self {
            transport: None,
            cancellation: None,
            topic: DICE_ROLL_CREATED_TOPIC.to_string(),
            delivery_capacity: DEFAULT_DELIVERY_CAPACITY,
        }
    }
}

impl BrokerHubConfig {
    pub fn new(transport: Arc<dyn Transport>, cancellation: CancellationToken) -> Self {
        Self {
            transport: Some(transport),
            cancellation: Some(cancellation),
            ..Default::default()
        }
    }

    pub fn with_topic(mut self, topic: impl Into<String>) -> Self {
        self.topic = topic.into();
        self
    }

    pub fn with_delivery_capacity(mut self, capacity: usize) -> Self {
        self.delivery_capacity = capacity;
        self
    }
}

/// Hub publishing events through a shared broker.
///
/// Subscriptions are local to this instance, but because every replica
/// consumes the shared topic, a handler registered here receives the events
/// notified by any replica.
pub struct BrokerHub {
    transport: Arc<dyn Transport>,
    topic: String,
    registry: Arc<HandlerRegistry>,
    cancellation: CancellationToken,
    receiver: Mutex<Option<JoinHandle<()>>>,
}

impl BrokerHub {
    /// Subscribes to the topic and starts the receive loop
    pub async fn new(config: BrokerHubConfig) -> Result<Self, EventError> {
        let transport = config
            .transport
            .ok_or_else(|| EventError::configuration("the transport client is required"))?;
        let parent = config
            .cancellation
            .ok_or_else(|| EventError::configuration("a cancellation token is required"))?;
        if config.topic.is_empty() {
            return Err(EventError::configuration("the topic can't be empty"));
        }
        if config.delivery_capacity == 0 {
            return Err(EventError::configuration(
                "the delivery capacity must be greater than zero",
            ));
        }

        let (delivery_tx, delivery_rx) = mpsc::channel(config.delivery_capacity);
        let subscription = transport
            .channel_subscribe(&config.topic, delivery_tx)
            .await
            .map_err(|e| EventError::transport("subscribe on dice roll created topic", e))?;

        // A child token lets shutdown stop this hub without cancelling the caller's token.
        let cancellation = parent.child_token();
        let registry = Arc::new(HandlerRegistry::new());
        let receive_loop = ReceiveLoop::new(
            config.topic.clone(),
            registry.clone(),
            delivery_rx,
            subscription,
            cancellation.clone(),
        );
        let handle = tokio::spawn(async move {
            receive_loop.run().await;
        });

        info!(topic = %config.topic, "Broker event hub ready");
        Ok(Self {
            transport,
            topic: config.topic,
            registry,
            cancellation,
            receiver: Mutex::new(Some(handle)),
        })
    }

    /// Stops the receive loop and waits until it has unsubscribed from the
    /// transport. Calling it more than once is a no-op.
    pub async fn shutdown(&self) {
        self.cancellation.cancel();

        let handle = self
            .receiver
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(handle) = handle {
            if let Err(e) = handle.await {
                warn!(topic = %self.topic, error = %e, "Receive loop task failed");
            }
        }
    }

    /// Whether the receive loop is still consuming the topic
    pub fn is_running(&self) -> bool {
        self.receiver
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    pub fn subscriber_count(&self, room_id: &str) -> usize {
        self.registry.subscriber_count(room_id)
    }
}

impl Drop for BrokerHub {
    fn drop(&mut self) {
        self.cancellation.cancel();
    }
}

#[async_trait]
impl Notifier for BrokerHub {
    async fn notify_dice_roll_created(&self, event: &DiceRollCreated) -> Result<(), EventError> {
        let payload = encode(event)?;

        self.transport
            .publish(&self.topic, payload)
            .await
            .map_err(|e| EventError::transport("publish dice roll created event", e))?;

        debug!(
            topic = %self.topic,
            room_id = %event.room_id(),
            dice_roll_id = %event.dice_roll.id,
            "DiceRollCreated event published"
        );
        Ok(())
    }
}

#[async_trait]
impl Subscriber for BrokerHub {
    async fn subscribe_dice_roll_created(
        &self,
        subscriber_id: &str,
        room_id: &str,
        handler: Arc<dyn DiceRollCreatedHandler>,
    ) -> Result<(), EventError> {
        let replaced = self.registry.set(room_id, subscriber_id, handler);
        debug!(
            room_id = %room_id,
            subscriber_id = %subscriber_id,
            replaced = replaced,
            "Subscribed to DiceRollCreated events"
        );
        Ok(())
    }

    async fn unsubscribe_dice_roll_created(
        &self,
        subscriber_id: &str,
        room_id: &str,
    ) -> Result<(), EventError> {
        let removed = self.registry.delete(room_id, subscriber_id);
        debug!(
            room_id = %room_id,
            subscriber_id = %subscriber_id,
            removed = removed,
            "Unsubscribed from DiceRollCreated events"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_transport_is_a_configuration_error() {
        let config = BrokerHubConfig {
            cancellation: Some(CancellationToken::new()),
            ..Default::default()
        };

        let result = BrokerHub::new(config).await;

        assert!(matches!(result, Err(EventError::Configuration(_))));
    }

    #[tokio::test]
    async fn test_missing_cancellation_is_a_configuration_error() {
        let config = BrokerHubConfig {
            transport: Some(Arc::new(LocalBroker::new())),
            ..Default::default()
        };

        let result = BrokerHub::new(config).await;

        assert!(matches!(result, Err(EventError::Configuration(_))));
    }

    #[tokio::test]
    async fn test_zero_delivery_capacity_is_rejected() {
        let config = BrokerHubConfig::new(Arc::new(LocalBroker::new()), CancellationToken::new())
            .with_delivery_capacity(0);

        assert!(matches!(
            BrokerHub::new(config).await,
            Err(EventError::Configuration(_))
        ));
    }

    #[tokio::test]
    async fn test_shutdown_is_idempotent_and_keeps_parent_token() {
        let broker = LocalBroker::new();
        let parent = CancellationToken::new();
        let hub = BrokerHub::new(BrokerHubConfig::new(
            Arc::new(broker.clone()),
            parent.clone(),
        ))
        .await
        .unwrap();
        assert!(hub.is_running());
        assert_eq!(broker.subscription_count(DICE_ROLL_CREATED_TOPIC), 1);

        hub.shutdown().await;
        hub.shutdown().await;

        assert!(!hub.is_running());
        assert!(!parent.is_cancelled());
        assert_eq!(broker.subscription_count(DICE_ROLL_CREATED_TOPIC), 0);
    }

    #[tokio::test]
    async fn test_parent_cancellation_stops_the_loop() {
        let broker = LocalBroker::new();
        let parent = CancellationToken::new();
        let hub = BrokerHub::new(BrokerHubConfig::new(
            Arc::new(broker.clone()),
            parent.clone(),
        ))
        .await
        .unwrap();

        parent.cancel();
        hub.shutdown().await;

        assert!(!hub.is_running());
        assert_eq!(broker.subscription_count(DICE_ROLL_CREATED_TOPIC), 0);
    }
}

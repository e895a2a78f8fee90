use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

use super::handler::{DiceRollCreatedHandler, EventError};
use super::hub::{Notifier, Subscriber};
use super::registry::HandlerRegistry;
use crate::model::DiceRollCreated;

/// Hub that dispatches events directly to the handlers registered in the
/// same process. Used for single instance deployments and as a fake in tests.
#[derive(Clone, Default)]
pub struct MemoryHub {
    registry: Arc<HandlerRegistry>,
}

impl MemoryHub {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscriber_count(&self, room_id: &str) -> usize {
        self.registry.subscriber_count(room_id)
    }
}

#[async_trait]
impl Notifier for MemoryHub {
    async fn notify_dice_roll_created(&self, event: &DiceRollCreated) -> Result<(), EventError> {
        let report = self.registry.broadcast(event).await;
        debug!(
            room_id = %event.room_id(),
            dice_roll_id = %event.dice_roll.id,
            delivered = report.delivered,
            failed = report.failed,
            "DiceRollCreated event dispatched"
        );
        Ok(())
    }
}

#[async_trait]
impl Subscriber for MemoryHub {
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

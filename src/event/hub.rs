use async_trait::async_trait;
use std::sync::Arc;

use super::handler::{DiceRollCreatedHandler, EventError};
use crate::model::DiceRollCreated;

/// Knows how to notify events to whoever is subscribed to them
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Notifies that a user created a new dice roll.
    ///
    /// Only publish path failures are returned; handler failures on the
    /// delivery side never reach the notifier's caller.
    async fn notify_dice_roll_created(&self, event: &DiceRollCreated) -> Result<(), EventError>;
}

/// Knows how to subscribe handlers to events of a room
#[async_trait]
pub trait Subscriber: Send + Sync {
    /// Registers `handler` for `(room_id, subscriber_id)`, replacing any
    /// handler already registered for that pair.
    async fn subscribe_dice_roll_created(
        &self,
        subscriber_id: &str,
        room_id: &str,
        handler: Arc<dyn DiceRollCreatedHandler>,
    ) -> Result<(), EventError>;

    /// Removes the handler for `(room_id, subscriber_id)`. Unknown pairs are a no-op.
    async fn unsubscribe_dice_roll_created(
        &self,
        subscriber_id: &str,
        room_id: &str,
    ) -> Result<(), EventError>;
}

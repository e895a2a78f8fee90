// Live room feed
//
// One subscription per room viewing session. Every delivered event is fanned
// out into two streams: rendered rows for the dice roll history and bare
// notifications for lightweight "new roll" badges.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info};
use uuid::Uuid;

use crate::event::{DiceRollCreatedHandler, EventError, HandlerError, Subscriber};
use crate::model::DiceRollCreated;

/// Row of the dice roll history as sent to the viewers
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiceRollRow {
    pub dice_roll_id: String,
    pub serial: u64,
    pub user_id: String,
    pub created_at: DateTime<Utc>,
    pub dice: Vec<String>,
    pub total: u64,
}

impl From<&DiceRollCreated> for DiceRollRow {
    fn from(event: &DiceRollCreated) -> Self {
        let roll = &event.dice_roll;
        Self {
            dice_roll_id: roll.id.clone(),
            serial: roll.serial,
            user_id: roll.user_id.clone(),
            created_at: roll.created_at,
            dice: roll.dice.iter().map(ToString::to_string).collect(),
            total: roll.total(),
        }
    }
}

struct FeedHandler {
    rows: mpsc::UnboundedSender<String>,
    notifications: mpsc::UnboundedSender<String>,
}

#[async_trait]
impl DiceRollCreatedHandler for FeedHandler {
    async fn handle(&self, event: DiceRollCreated) -> Result<(), HandlerError> {
        let row = serde_json::to_string(&DiceRollRow::from(&event))
            .map_err(|e| HandlerError::new(format!("could not render row: {e}")))?;

        let row_sent = self.rows.send(row).is_ok();
        let notification_sent = self.notifications.send(event.dice_roll.id).is_ok();

        if !row_sent && !notification_sent {
            return Err(HandlerError::new("feed session is gone"));
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        "FeedHandler"
    }
}

/// A viewer's live connection to a room
pub struct FeedSession {
    session_id: String,
    room_id: String,
    subscriber: Arc<dyn Subscriber>,
    /// Rendered rows, one per new dice roll
    pub rows: mpsc::UnboundedReceiver<String>,
    /// Dice roll ids, one per new dice roll
    pub notifications: mpsc::UnboundedReceiver<String>,
}

impl FeedSession {
    pub async fn open(subscriber: Arc<dyn Subscriber>, room_id: &str) -> Result<Self, EventError> {
        let (rows_tx, rows) = mpsc::unbounded_channel();
        let (notifications_tx, notifications) = mpsc::unbounded_channel();
        let session_id = Uuid::new_v4().to_string();

        subscriber
            .subscribe_dice_roll_created(
                &session_id,
                room_id,
                Arc::new(FeedHandler {
                    rows: rows_tx,
                    notifications: notifications_tx,
                }),
            )
            .await?;

        info!(room_id = %room_id, session_id = %session_id, "Feed session opened");
        Ok(Self {
            session_id,
            room_id: room_id.to_string(),
            subscriber,
            rows,
            notifications,
        })
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn room_id(&self) -> &str {
        &self.room_id
    }

    pub async fn close(self) -> Result<(), EventError> {
        self.subscriber
            .unsubscribe_dice_roll_created(&self.session_id, &self.room_id)
            .await?;
        debug!(room_id = %self.room_id, session_id = %self.session_id, "Feed session closed");
        Ok(())
    }
}

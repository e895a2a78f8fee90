use chrono::Utc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, instrument};
use uuid::Uuid;

use super::roller::Roller;
use crate::event::{DiceRollCreatedHandler, EventError, Notifier, Subscriber};
use crate::model::{DiceRoll, DiceRollCreated, DieRoll, DieType};

/// Maximum number of dice rolled at once
pub const MAX_DICE_PER_ROLL: usize = 100;

#[derive(Debug, Error)]
pub enum DiceError {
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Could not roll the dice: {0}")]
    Roll(String),

    #[error("Event error: {0}")]
    Event(#[from] EventError),
}

#[derive(Debug, Clone)]
pub struct CreateDiceRollRequest {
    pub room_id: String,
    pub user_id: String,
    pub dice: Vec<DieType>,
}

impl CreateDiceRollRequest {
    fn validate(&self) -> Result<(), DiceError> {
        if self.room_id.is_empty() {
            return Err(DiceError::InvalidRequest("room id is required".to_string()));
        }
        if self.user_id.is_empty() {
            return Err(DiceError::InvalidRequest("user id is required".to_string()));
        }
        if self.dice.is_empty() {
            return Err(DiceError::InvalidRequest(
                "minimum dice quantity is 1".to_string(),
            ));
        }
        if self.dice.len() > MAX_DICE_PER_ROLL {
            return Err(DiceError::InvalidRequest(format!(
                "max dice quantity is {}, got {}",
                MAX_DICE_PER_ROLL,
                self.dice.len()
            )));
        }
        Ok(())
    }
}

/// Active subscription of a room viewer, obtained from
/// [`DiceService::subscribe_dice_roll_created`]
pub struct RoomSubscription {
    subscriber: Arc<dyn Subscriber>,
    subscription_id: String,
    room_id: String,
}

impl RoomSubscription {
    pub fn id(&self) -> &str {
        &self.subscription_id
    }

    pub fn room_id(&self) -> &str {
        &self.room_id
    }

    pub async fn unsubscribe(self) -> Result<(), DiceError> {
        self.subscriber
            .unsubscribe_dice_roll_created(&self.subscription_id, &self.room_id)
            .await?;
        Ok(())
    }
}

/// Application service for dice rolls
pub struct DiceService {
    roller: Arc<dyn Roller>,
    notifier: Arc<dyn Notifier>,
    subscriber: Arc<dyn Subscriber>,
    serial: AtomicU64,
}

impl DiceService {
    pub fn new(
        roller: Arc<dyn Roller>,
        notifier: Arc<dyn Notifier>,
        subscriber: Arc<dyn Subscriber>,
    ) -> Self {
        Self {
            roller,
            notifier,
            subscriber,
            serial: AtomicU64::new(0),
        }
    }

    /// Lists all the dice types supported by the app
    pub fn list_dice_types(&self) -> Vec<DieType> {
        DieType::all()
    }

    /// Rolls the requested dice and notifies the new roll to the room
    #[instrument(skip(self, request), fields(room_id = %request.room_id, user_id = %request.user_id))]
    pub async fn create_dice_roll(
        &self,
        request: CreateDiceRollRequest,
    ) -> Result<DiceRoll, DiceError> {
        request.validate()?;

        let mut dice_roll = DiceRoll {
            id: Uuid::new_v4().to_string(),
            serial: self.serial.fetch_add(1, Ordering::SeqCst) + 1,
            created_at: Utc::now(),
            room_id: request.room_id,
            user_id: request.user_id,
            dice: request
                .dice
                .into_iter()
                .map(|die_type| DieRoll::new(Uuid::new_v4().to_string(), die_type, 0))
                .collect(),
        };

        self.roller.roll(&mut dice_roll)?;
        debug!(dice_roll_id = %dice_roll.id, total = dice_roll.total(), "Dice rolled");

        self.notifier
            .notify_dice_roll_created(&DiceRollCreated::new(dice_roll.clone()))
            .await?;

        Ok(dice_roll)
    }

    /// Subscribes a new viewer of the room to its dice roll created events
    #[instrument(skip(self, handler))]
    pub async fn subscribe_dice_roll_created(
        &self,
        room_id: &str,
        handler: Arc<dyn DiceRollCreatedHandler>,
    ) -> Result<RoomSubscription, DiceError> {
        if room_id.is_empty() {
            return Err(DiceError::InvalidRequest("room id is required".to_string()));
        }

        let subscription_id = Uuid::new_v4().to_string();
        self.subscriber
            .subscribe_dice_roll_created(&subscription_id, room_id, handler)
            .await?;

        info!(subscription_id = %subscription_id, "Room viewer subscribed");
        Ok(RoomSubscription {
            subscriber: self.subscriber.clone(),
            subscription_id,
            room_id: room_id.to_string(),
        })
    }
}

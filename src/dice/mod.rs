// Dice rolling application service
//
// Creates dice rolls for users in a room and publishes them through the
// event hub so every viewer of the room gets them live.

pub use roller::{RandomRoller, Roller};
pub use service::{
    CreateDiceRollRequest, DiceError, DiceService, RoomSubscription, MAX_DICE_PER_ROLL,
};

mod roller;
mod service;

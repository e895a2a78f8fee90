// Domain model shared by the dice service, the event hubs and the wire codec.

pub use dice::{DiceRoll, DieRoll, DieType, UnknownDieType};
pub use events::DiceRollCreated;

mod dice;
mod events;

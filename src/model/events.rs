use super::dice::DiceRoll;

/// A dice roll has been created in a room.
///
/// Events represent facts about things that have already happened and are
/// never mutated after being published.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DiceRollCreated {
    pub dice_roll: DiceRoll,
}

impl DiceRollCreated {
    pub fn new(dice_roll: DiceRoll) -> Self {
        Self { dice_roll }
    }

    /// Room the event belongs to, used to route it to subscribers
    pub fn room_id(&self) -> &str {
        &self.dice_roll.room_id
    }
}

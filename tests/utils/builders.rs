use chrono::{DateTime, TimeZone, Utc};

use rollify::model::{DiceRoll, DiceRollCreated, DieRoll, DieType};

// ============================================================================
// Event Builders
// ============================================================================

pub struct DiceRollBuilder {
    roll: DiceRoll,
}

#[allow(dead_code)]
impl DiceRollBuilder {
    pub fn new(id: &str) -> Self {
        Self {
            roll: DiceRoll {
                id: id.to_string(),
                ..Default::default()
            },
        }
    }

    pub fn in_room(mut self, room_id: &str) -> Self {
        self.roll.room_id = room_id.to_string();
        self
    }

    pub fn by_user(mut self, user_id: &str) -> Self {
        self.roll.user_id = user_id.to_string();
        self
    }

    pub fn with_serial(mut self, serial: u64) -> Self {
        self.roll.serial = serial;
        self
    }

    pub fn created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.roll.created_at = created_at;
        self
    }

    pub fn with_die(mut self, die_type: DieType, side: u64) -> Self {
        let id = format!("{}-die{}", self.roll.id, self.roll.dice.len());
        self.roll.dice.push(DieRoll::new(id, die_type, side));
        self
    }

    /// A roll with every field populated
    pub fn complete(id: &str, room_id: &str) -> Self {
        Self::new(id)
            .in_room(room_id)
            .by_user("user0-id")
            .with_serial(42)
            .created_at(Utc.with_ymd_and_hms(2024, 3, 9, 18, 30, 5).unwrap())
            .with_die(DieType::D4, 2)
            .with_die(DieType::D6, 4)
            .with_die(DieType::D20, 20)
    }

    pub fn build(self) -> DiceRoll {
        self.roll
    }

    pub fn build_event(self) -> DiceRollCreated {
        DiceRollCreated::new(self.roll)
    }
}

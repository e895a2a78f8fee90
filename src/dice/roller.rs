use rand::Rng;

use super::service::DiceError;
use crate::model::DiceRoll;

/// Knows how to roll the dice of a dice roll, setting the side of each die
pub trait Roller: Send + Sync {
    fn roll(&self, dice_roll: &mut DiceRoll) -> Result<(), DiceError>;
}

/// Rolls every die using the thread local random generator
pub struct RandomRoller;

impl Roller for RandomRoller {
    fn roll(&self, dice_roll: &mut DiceRoll) -> Result<(), DiceError> {
        let mut rng = rand::rng();
        for die in dice_roll.dice.iter_mut() {
            die.side = rng.random_range(1..=die.die_type.sides());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{DieRoll, DieType};

    #[test]
    fn test_random_roller_stays_within_die_sides() {
        let mut roll = DiceRoll {
            dice: DieType::all()
                .into_iter()
                .cycle()
                .take(600)
                .enumerate()
                .map(|(i, die_type)| DieRoll::new(format!("die-{i}"), die_type, 0))
                .collect(),
            ..Default::default()
        };

        RandomRoller.roll(&mut roll).unwrap();

        for die in &roll.dice {
            assert!(
                (1..=die.die_type.sides()).contains(&die.side),
                "{} rolled out of range",
                die
            );
        }
    }
}

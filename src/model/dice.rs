use chrono::{DateTime, Utc};
use std::fmt;
use strum::IntoEnumIterator;
use strum_macros::EnumIter;
use thiserror::Error;

/// Returned when a die type identifier is not one of the known dice
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0} die type is not valid")]
pub struct UnknownDieType(pub String);

/// The physical type of a die
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter)]
pub enum DieType {
    D4,
    D6,
    D8,
    D10,
    D12,
    D20,
}

impl DieType {
    /// Stable identifier used on the wire, e.g. `d20`
    pub fn id(&self) -> &'static str {
        match self {
            DieType::D4 => "d4",
            DieType::D6 => "d6",
            DieType::D8 => "d8",
            DieType::D10 => "d10",
            DieType::D12 => "d12",
            DieType::D20 => "d20",
        }
    }

    /// Display name, e.g. `D20`
    pub fn name(&self) -> &'static str {
        match self {
            DieType::D4 => "D4",
            DieType::D6 => "D6",
            DieType::D8 => "D8",
            DieType::D10 => "D10",
            DieType::D12 => "D12",
            DieType::D20 => "D20",
        }
    }

    pub fn sides(&self) -> u64 {
        match self {
            DieType::D4 => 4,
            DieType::D6 => 6,
            DieType::D8 => 8,
            DieType::D10 => 10,
            DieType::D12 => 12,
            DieType::D20 => 20,
        }
    }

    /// Looks up a die type by its identifier, failing on anything unknown
    pub fn from_id(id: &str) -> Result<Self, UnknownDieType> {
        DieType::iter()
            .find(|die_type| die_type.id() == id)
            .ok_or_else(|| UnknownDieType(id.to_string()))
    }

    /// Every supported die type, smallest first
    pub fn all() -> Vec<DieType> {
        DieType::iter().collect()
    }
}

impl fmt::Display for DieType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id())
    }
}

impl TryFrom<&str> for DieType {
    type Error = UnknownDieType;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        DieType::from_id(s)
    }
}

/// A single die inside a dice roll
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DieRoll {
    pub id: String,
    pub die_type: DieType,
    /// Side we got after rolling, 1-based. Zero until the die is rolled.
    pub side: u64,
}

impl DieRoll {
    pub fn new(id: impl Into<String>, die_type: DieType, side: u64) -> Self {
        Self {
            id: id.into(),
            die_type,
            side,
        }
    }
}

impl fmt::Display for DieRoll {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.die_type, self.side)
    }
}

/// A set of dice rolled together by a user in a room
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DiceRoll {
    pub id: String,
    /// Monotonically increasing across the rolls of the application
    pub serial: u64,
    pub created_at: DateTime<Utc>,
    pub room_id: String,
    pub user_id: String,
    pub dice: Vec<DieRoll>,
}

impl DiceRoll {
    /// Sum of every rolled side
    pub fn total(&self) -> u64 {
        self.dice.iter().map(|d| d.side).sum()
    }
}

impl fmt::Display for DiceRoll {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{} {}:", self.serial, self.user_id)?;
        for die in &self.dice {
            write!(f, " {}", die)?;
        }
        write!(f, " (total {})", self.total())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(DieType::D4, "d4", "D4", 4)]
    #[case(DieType::D6, "d6", "D6", 6)]
    #[case(DieType::D8, "d8", "D8", 8)]
    #[case(DieType::D10, "d10", "D10", 10)]
    #[case(DieType::D12, "d12", "D12", 12)]
    #[case(DieType::D20, "d20", "D20", 20)]
    fn test_die_type_static_data(
        #[case] die_type: DieType,
        #[case] id: &str,
        #[case] name: &str,
        #[case] sides: u64,
    ) {
        assert_eq!(die_type.id(), id);
        assert_eq!(die_type.name(), name);
        assert_eq!(die_type.sides(), sides);
        assert_eq!(DieType::from_id(id), Ok(die_type));
        assert_eq!(DieType::try_from(id), Ok(die_type));
    }

    #[rstest]
    #[case("d100")]
    #[case("D6")]
    #[case("")]
    #[case("6")]
    fn test_unknown_die_type_is_rejected(#[case] id: &str) {
        assert_eq!(DieType::from_id(id), Err(UnknownDieType(id.to_string())));
    }

    #[test]
    fn test_all_die_types_are_listed_in_order() {
        let ids: Vec<_> = DieType::all().iter().map(|d| d.id()).collect();
        assert_eq!(ids, vec!["d4", "d6", "d8", "d10", "d12", "d20"]);
    }

    #[test]
    fn test_dice_roll_display() {
        let roll = DiceRoll {
            id: "dr0".to_string(),
            serial: 7,
            room_id: "room0".to_string(),
            user_id: "alice".to_string(),
            dice: vec![
                DieRoll::new("d0", DieType::D6, 4),
                DieRoll::new("d1", DieType::D20, 17),
            ],
            ..Default::default()
        };

        assert_eq!(roll.total(), 21);
        assert_eq!(roll.to_string(), "#7 alice: d6:4 d20:17 (total 21)");
    }
}

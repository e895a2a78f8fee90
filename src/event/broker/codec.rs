//! JSON wire format of the events shared through the broker.
//!
//! ```json
//! {"DiceRoll": {"ID": "...", "Serial": 42, "CreatedAt": "2024-01-01T10:00:00.000000000Z",
//!   "RoomID": "...", "UserID": "...", "Dice": [{"ID": "...", "Type": "d20", "Side": 17}]}}
//! ```
//!
//! Die types travel as their stable identifier. Decoding an unknown identifier
//! fails the whole message.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::{DiceRoll, DiceRollCreated, DieRoll, DieType, UnknownDieType};

#[derive(Debug, Error)]
pub enum CodecError {
    #[error("Could not encode event: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("Could not decode event: {0}")]
    Decode(#[source] serde_json::Error),

    #[error(transparent)]
    UnknownDieType(#[from] UnknownDieType),
}

#[derive(Debug, Serialize, Deserialize)]
struct WireDiceRollCreated {
    #[serde(rename = "DiceRoll")]
    dice_roll: WireDiceRoll,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct WireDiceRoll {
    #[serde(rename = "ID")]
    id: String,
    serial: u64,
    #[serde(with = "rfc3339")]
    created_at: DateTime<Utc>,
    #[serde(rename = "RoomID")]
    room_id: String,
    #[serde(rename = "UserID")]
    user_id: String,
    dice: Vec<WireDieRoll>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct WireDieRoll {
    #[serde(rename = "ID")]
    id: String,
    #[serde(rename = "Type")]
    die_type: String,
    side: u64,
}

mod rfc3339 {
    use chrono::{DateTime, SecondsFormat, Utc};
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(t: &DateTime<Utc>, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&t.to_rfc3339_opts(SecondsFormat::Nanos, true))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(d)?;
        DateTime::parse_from_rfc3339(&raw)
            .map(|t| t.with_timezone(&Utc))
            .map_err(de::Error::custom)
    }
}

/// Serializes an event into its wire representation
pub fn encode(event: &DiceRollCreated) -> Result<Vec<u8>, CodecError> {
    let roll = &event.dice_roll;
    let wire = WireDiceRollCreated {
        dice_roll: WireDiceRoll {
            id: roll.id.clone(),
            serial: roll.serial,
            created_at: roll.created_at,
            room_id: roll.room_id.clone(),
            user_id: roll.user_id.clone(),
            dice: roll
                .dice
                .iter()
                .map(|die| WireDieRoll {
                    id: die.id.clone(),
                    die_type: die.die_type.id().to_string(),
                    side: die.side,
                })
                .collect(),
        },
    };

    serde_json::to_vec(&wire).map_err(CodecError::Encode)
}

/// Deserializes an event from its wire representation
pub fn decode(data: &[u8]) -> Result<DiceRollCreated, CodecError> {
    let wire: WireDiceRollCreated = serde_json::from_slice(data).map_err(CodecError::Decode)?;
    let roll = wire.dice_roll;

    let dice = roll
        .dice
        .into_iter()
        .map(|die| -> Result<DieRoll, CodecError> {
            Ok(DieRoll {
                id: die.id,
                die_type: DieType::from_id(&die.die_type)?,
                side: die.side,
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(DiceRollCreated::new(DiceRoll {
        id: roll.id,
        serial: roll.serial,
        created_at: roll.created_at,
        room_id: roll.room_id,
        user_id: roll.user_id,
        dice,
    }))
}

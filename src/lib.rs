// Library crate for the Rollify dice rolling server
// This file exposes the public API for integration tests

pub mod config;
pub mod dice;
pub mod event;
pub mod feed;
pub mod model;

// Re-export commonly used types for easier access in tests
pub use config::{AppConfig, HubKind};
pub use dice::{CreateDiceRollRequest, DiceService, RandomRoller};
pub use event::{
    BrokerHub, BrokerHubConfig, DiceRollCreatedHandler, EventError, LocalBroker, MemoryHub,
    Notifier, Subscriber,
};
pub use feed::FeedSession;
pub use model::{DiceRoll, DiceRollCreated, DieRoll, DieType};

use std::env;
use strum_macros::{AsRefStr, EnumString};
use thiserror::Error;

use crate::event::{DEFAULT_DELIVERY_CAPACITY, DICE_ROLL_CREATED_TOPIC};

pub const ENV_EVENT_HUB: &str = "ROLLIFY_EVENT_HUB";
pub const ENV_EVENT_TOPIC: &str = "ROLLIFY_EVENT_TOPIC";
pub const ENV_DELIVERY_CAPACITY: &str = "ROLLIFY_DELIVERY_CAPACITY";
pub const ENV_REPLICAS: &str = "ROLLIFY_REPLICAS";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid value {value:?} for {key}: {reason}")]
    InvalidValue {
        key: &'static str,
        value: String,
        reason: String,
    },
}

/// Which hub backs the Notifier and Subscriber of the application
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString, AsRefStr)]
#[strum(serialize_all = "lowercase")]
pub enum HubKind {
    Memory,
    Broker,
}

/// Application configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub hub_kind: HubKind,
    /// Topic shared by every broker hub replica
    pub topic: String,
    pub delivery_capacity: usize,
    /// Number of broker hub replicas started in this process
    pub replicas: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            hub_kind: HubKind::Memory,
            topic: DICE_ROLL_CREATED_TOPIC.to_string(),
            delivery_capacity: DEFAULT_DELIVERY_CAPACITY,
            replicas: 2,
        }
    }
}

impl AppConfig {
    /// Loads the configuration from the environment, falling back to defaults
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(value) = lookup(ENV_EVENT_HUB) {
            config.hub_kind = value
                .parse()
                .map_err(|_| invalid(ENV_EVENT_HUB, &value, "expected memory or broker"))?;
        }
        if let Some(value) = lookup(ENV_EVENT_TOPIC) {
            if value.is_empty() {
                return Err(invalid(ENV_EVENT_TOPIC, &value, "topic can't be empty"));
            }
            config.topic = value;
        }
        if let Some(value) = lookup(ENV_DELIVERY_CAPACITY) {
            config.delivery_capacity = parse_positive(ENV_DELIVERY_CAPACITY, &value)?;
        }
        if let Some(value) = lookup(ENV_REPLICAS) {
            config.replicas = parse_positive(ENV_REPLICAS, &value)?;
        }

        Ok(config)
    }
}

fn parse_positive(key: &'static str, value: &str) -> Result<usize, ConfigError> {
    match value.parse::<usize>() {
        Ok(0) => Err(invalid(key, value, "must be greater than zero")),
        Ok(n) => Ok(n),
        Err(e) => Err(invalid(key, value, &e.to_string())),
    }
}

fn invalid(key: &'static str, value: &str, reason: &str) -> ConfigError {
    ConfigError::InvalidValue {
        key,
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

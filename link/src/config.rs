//! Configuration for the link layer.

use std::env;

/// Default archive directory on the peripheral.
const DEFAULT_DEVICE_ROOT: &str = "/ext/archive";

/// Default capacity of the sync event broadcast channel.
const DEFAULT_EVENT_CAPACITY: usize = 64;

/// Link configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Directory on the peripheral holding the mirrored archive
    pub device_root: String,
    /// Capacity of the sync event broadcast channel
    pub event_capacity: usize,
}

impl Config {
    /// Load configuration from environment variables, falling back to
    /// defaults for anything unset.
    pub fn from_env() -> Result<Self, ConfigError> {
        let device_root =
            env::var("FERRY_DEVICE_ROOT").unwrap_or_else(|_| DEFAULT_DEVICE_ROOT.to_string());

        let event_capacity = match env::var("FERRY_EVENT_CAPACITY") {
            Ok(value) => value.parse().map_err(|_| ConfigError::InvalidEventCapacity)?,
            Err(_) => DEFAULT_EVENT_CAPACITY,
        };

        if event_capacity == 0 {
            return Err(ConfigError::InvalidEventCapacity);
        }

        Ok(Self {
            device_root,
            event_capacity,
        })
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            device_root: DEFAULT_DEVICE_ROOT.to_string(),
            event_capacity: DEFAULT_EVENT_CAPACITY,
        }
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid FERRY_EVENT_CAPACITY value")]
    InvalidEventCapacity,
}

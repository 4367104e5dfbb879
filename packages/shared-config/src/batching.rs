//! Batching loader configuration types

use std::time::Duration;

use crate::{parse_env, ConfigError, ConfigResult};

/// Default number of keys dispatched in one batch
pub const DEFAULT_MAX_BATCH_SIZE: usize = 1000;

/// Default time a batch waits for more keys before dispatching
pub const DEFAULT_DELAY_MS: u64 = 1;

/// Settings applied to every batching loader created for a request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchingConfig {
    /// Maximum number of keys per dispatched batch
    pub max_batch_size: usize,

    /// Delay in milliseconds before a pending batch is dispatched
    pub delay_ms: u64,
}

impl BatchingConfig {
    /// Load batching configuration from environment variables
    pub fn from_env() -> ConfigResult<Self> {
        let config = Self {
            max_batch_size: parse_env("LOADER_MAX_BATCH_SIZE", DEFAULT_MAX_BATCH_SIZE)?,
            delay_ms: parse_env("LOADER_DELAY_MS", DEFAULT_DELAY_MS)?,
        };
        config.validate()?;
        Ok(config)
    }

    /// Reject settings that would stall every batch
    pub fn validate(&self) -> ConfigResult<()> {
        if self.max_batch_size == 0 {
            return Err(ConfigError::ValidationError(
                "LOADER_MAX_BATCH_SIZE must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Batch delay as a [`Duration`]
    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }
}

impl Default for BatchingConfig {
    fn default() -> Self {
        Self {
            max_batch_size: DEFAULT_MAX_BATCH_SIZE,
            delay_ms: DEFAULT_DELAY_MS,
        }
    }
}

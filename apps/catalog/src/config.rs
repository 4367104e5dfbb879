//! Catalog demo configuration

use anyhow::{Context, Result};
use keyfetch_shared_config::{parse_env, CommonConfig};

/// Catalog configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    /// Common configuration shared with other services
    pub common: CommonConfig,

    /// Pretty-print the JSON report (default: true)
    pub pretty: bool,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let common = CommonConfig::from_env().context("Failed to load common config")?;

        Ok(Self {
            common,
            pretty: parse_env("CATALOG_PRETTY", true).context("Invalid CATALOG_PRETTY value")?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        temp_env::with_vars_unset(
            ["CATALOG_PRETTY", "LOADER_MAX_BATCH_SIZE", "LOADER_DELAY_MS"],
            || {
                let config = Config::from_env().unwrap();
                assert!(config.pretty);
                assert_eq!(config.common.batching.max_batch_size, 1000);
            },
        );
    }

    #[test]
    fn test_zero_batch_size_is_rejected() {
        temp_env::with_var("LOADER_MAX_BATCH_SIZE", Some("0"), || {
            let err = Config::from_env().unwrap_err();
            assert!(format!("{:#}", err).contains("LOADER_MAX_BATCH_SIZE"));
        });
    }

    #[test]
    fn test_invalid_pretty_flag() {
        temp_env::with_vars(
            [
                ("CATALOG_PRETTY", Some("sometimes")),
                ("LOADER_MAX_BATCH_SIZE", None),
            ],
            || {
                assert!(Config::from_env().is_err());
            },
        );
    }
}

//! Application configuration.
//!
//! Loaded from environment variables with fallback to defaults.
//!
//! | Variable                          | Default            |
//! |-----------------------------------|--------------------|
//! | `ORFEBRE_DB_PATH`                 | `./orfebre_dev.db` |
//! | `ORFEBRE_MAX_CONNECTIONS`         | `5`                |
//! | `ORFEBRE_FALLBACK_GOLD_USD_OZ`    | `2000`             |
//! | `ORFEBRE_FALLBACK_SILVER_USD_OZ`  | `30`               |
//! | `ORFEBRE_FALLBACK_EXCHANGE_RATE`  | `4000`             |
//! | `ORFEBRE_DEFAULT_GRAMS_PER_MONTH` | `509`              |

use orfebre_core::FallbackPolicy;
use serde::{Deserialize, Serialize};
use std::env;
use std::str::FromStr;

use crate::pool::DbConfig;

/// Deployment configuration for the storage layer and its binaries.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// SQLite database file
    pub database_path: String,

    /// Pool size
    pub max_connections: u32,

    /// Substitutes for missing market data and configuration
    pub fallback: FallbackPolicy,
}

impl AppConfig {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = FallbackPolicy::default();

        let config = AppConfig {
            database_path: lookup("ORFEBRE_DB_PATH")
                .unwrap_or_else(|| "./orfebre_dev.db".to_string()),

            max_connections: parse(&lookup, "ORFEBRE_MAX_CONNECTIONS", 5)?,

            fallback: FallbackPolicy {
                gold_usd_per_ounce: parse(
                    &lookup,
                    "ORFEBRE_FALLBACK_GOLD_USD_OZ",
                    defaults.gold_usd_per_ounce,
                )?,
                silver_usd_per_ounce: parse(
                    &lookup,
                    "ORFEBRE_FALLBACK_SILVER_USD_OZ",
                    defaults.silver_usd_per_ounce,
                )?,
                exchange_rate: parse(
                    &lookup,
                    "ORFEBRE_FALLBACK_EXCHANGE_RATE",
                    defaults.exchange_rate,
                )?,
                grams_produced_per_month: parse(
                    &lookup,
                    "ORFEBRE_DEFAULT_GRAMS_PER_MONTH",
                    defaults.grams_produced_per_month,
                )?,
            },
        };

        if config.max_connections == 0 {
            return Err(ConfigError::InvalidValue(
                "ORFEBRE_MAX_CONNECTIONS".to_string(),
            ));
        }

        config
            .fallback
            .validate()
            .map_err(|e| ConfigError::InvalidValue(e.to_string()))?;

        Ok(config)
    }

    /// Pool configuration for this deployment.
    pub fn db_config(&self) -> DbConfig {
        DbConfig::new(&self.database_path).max_connections(self.max_connections)
    }
}

fn parse<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: T,
) -> Result<T, ConfigError> {
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue(key.to_string())),
        None => Ok(default),
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}")]
    InvalidValue(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = AppConfig::from_lookup(|_| None).unwrap();
        assert_eq!(config.database_path, "./orfebre_dev.db");
        assert_eq!(config.max_connections, 5);
        assert_eq!(config.fallback, FallbackPolicy::default());
    }

    #[test]
    fn test_overrides() {
        let config = AppConfig::from_lookup(lookup_from(&[
            ("ORFEBRE_DB_PATH", "/var/lib/orfebre.db"),
            ("ORFEBRE_FALLBACK_SILVER_USD_OZ", " 32.5 "),
            ("ORFEBRE_DEFAULT_GRAMS_PER_MONTH", "600"),
        ]))
        .unwrap();

        assert_eq!(config.database_path, "/var/lib/orfebre.db");
        assert_eq!(config.fallback.silver_usd_per_ounce, 32.5);
        assert_eq!(config.fallback.grams_produced_per_month, 600.0);
        assert_eq!(config.fallback.gold_usd_per_ounce, 2000.0);
    }

    #[test]
    fn test_invalid_values() {
        let err = AppConfig::from_lookup(lookup_from(&[("ORFEBRE_MAX_CONNECTIONS", "many")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue(ref key) if key == "ORFEBRE_MAX_CONNECTIONS"));

        assert!(AppConfig::from_lookup(lookup_from(&[("ORFEBRE_FALLBACK_EXCHANGE_RATE", "0")]))
            .is_err());
    }
}

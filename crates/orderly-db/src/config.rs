//! Environment-driven database configuration.
//!
//! Variables are optional; anything unset keeps the [`DbConfig::new`]
//! default.
//!
//! | Variable | Field |
//! |---|---|
//! | `ORDERLY_DATABASE_PATH` | `database_path` (default `./orderly.db`) |
//! | `ORDERLY_MAX_CONNECTIONS` | `max_connections` |
//! | `ORDERLY_MIN_CONNECTIONS` | `min_connections` |
//! | `ORDERLY_ACQUIRE_TIMEOUT_SECS` | `connect_timeout` |
//! | `ORDERLY_LOCK_TIMEOUT_MS` | `lock_timeout` |
//! | `ORDERLY_TRANSACTION_TIMEOUT_MS` | `transaction_timeout` |
//! | `ORDERLY_RUN_MIGRATIONS` | `run_migrations` |

use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::pool::DbConfig;

const DEFAULT_DATABASE_PATH: &str = "./orderly.db";

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}")]
    InvalidValue(String),

    #[error("min_connections ({min}) exceeds max_connections ({max})")]
    PoolBounds { min: u32, max: u32 },
}

impl DbConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from any key/value source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let path = lookup("ORDERLY_DATABASE_PATH").unwrap_or_else(|| DEFAULT_DATABASE_PATH.to_string());
        let mut config = DbConfig::new(path);

        if let Some(max) = parse(&lookup, "ORDERLY_MAX_CONNECTIONS")? {
            config.max_connections = max;
        }
        if let Some(min) = parse(&lookup, "ORDERLY_MIN_CONNECTIONS")? {
            config.min_connections = min;
        }
        if let Some(secs) = parse(&lookup, "ORDERLY_ACQUIRE_TIMEOUT_SECS")? {
            config.connect_timeout = Duration::from_secs(secs);
        }
        if let Some(ms) = parse(&lookup, "ORDERLY_LOCK_TIMEOUT_MS")? {
            config.lock_timeout = Duration::from_millis(ms);
        }
        if let Some(ms) = parse(&lookup, "ORDERLY_TRANSACTION_TIMEOUT_MS")? {
            config.transaction_timeout = Duration::from_millis(ms);
        }
        if let Some(run) = parse(&lookup, "ORDERLY_RUN_MIGRATIONS")? {
            config.run_migrations = run;
        }

        if config.max_connections == 0 {
            return Err(ConfigError::InvalidValue("ORDERLY_MAX_CONNECTIONS".to_string()));
        }
        if config.min_connections > config.max_connections {
            return Err(ConfigError::PoolBounds {
                min: config.min_connections,
                max: config.max_connections,
            });
        }

        Ok(config)
    }
}

fn parse<T, F>(lookup: &F, key: &str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::InvalidValue(key.to_string())),
    }
}

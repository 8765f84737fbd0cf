use std::{env, fmt::Display, path::PathBuf, str::FromStr};

use thiserror::Error;
use tracing::{info, warn};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// Seven days.
const DEFAULT_SESSION_TTL_SECONDS: &str = "604800";

/// One year.
pub const MAX_SESSION_TTL_SECONDS: u64 = 365 * 24 * 60 * 60;

#[derive(Debug, Clone)]
pub struct Config {
    pub bind_address: String,
    pub port: u16,
    /// Root directory of the document store.
    pub data_dir: PathBuf,
    /// Database (sub-directory) name inside `data_dir`.
    pub database_name: String,
    pub session_ttl_seconds: u64,
    /// How often expired sessions are purged.
    pub cleanup_interval_seconds: u64,
}

impl Config {
    pub fn load() -> Result<Self, ConfigError> {
        let config = Self {
            bind_address: try_load("BIND_ADDRESS", "0.0.0.0")?,
            port: try_load("PORT", "10000")?,
            data_dir: try_load("DATA_DIR", "./data")?,
            database_name: try_load("DATABASE_NAME", "TypingTest")?,
            session_ttl_seconds: try_load("SESSION_TTL_SECONDS", DEFAULT_SESSION_TTL_SECONDS)?,
            cleanup_interval_seconds: try_load("CLEANUP_INTERVAL_SECONDS", "3600")?,
        };
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.session_ttl_seconds == 0 || self.session_ttl_seconds > MAX_SESSION_TTL_SECONDS {
            return Err(ConfigError::InvalidValue {
                key: "SESSION_TTL_SECONDS".to_string(),
                message: format!("must be between 1 and {}", MAX_SESSION_TTL_SECONDS),
            });
        }
        if self.cleanup_interval_seconds == 0 {
            return Err(ConfigError::InvalidValue {
                key: "CLEANUP_INTERVAL_SECONDS".to_string(),
                message: "must be greater than zero".to_string(),
            });
        }
        if self.database_name.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                key: "DATABASE_NAME".to_string(),
                message: "must not be empty".to_string(),
            });
        }
        Ok(())
    }

    pub fn listen_address(&self) -> String {
        format!("{}:{}", self.bind_address, self.port)
    }

    /// Directory holding this database's collections.
    pub fn database_dir(&self) -> PathBuf {
        self.data_dir.join(&self.database_name)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1".to_string(),
            port: 10000,
            data_dir: PathBuf::from("./data"),
            database_name: "TypingTest".to_string(),
            session_ttl_seconds: 604_800,
            cleanup_interval_seconds: 3600,
        }
    }
}

fn try_load<T: FromStr>(key: &str, default: &str) -> Result<T, ConfigError>
where
    T::Err: Display,
{
    let raw = env::var(key).unwrap_or_else(|_| {
        info!("{key} not set, using default: {default}");
        default.to_string()
    });
    raw.parse().map_err(|e: T::Err| {
        warn!("Invalid {key} value: {e}");
        ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.listen_address(), "127.0.0.1:10000");
        assert_eq!(config.database_dir(), PathBuf::from("./data/TypingTest"));
    }

    #[test]
    fn test_zero_ttl_rejected() {
        let config = Config {
            session_ttl_seconds: 0,
            ..Config::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue { .. })
        ));
    }

    #[test]
    fn test_ttl_upper_bound() {
        let at_max = Config {
            session_ttl_seconds: MAX_SESSION_TTL_SECONDS,
            ..Config::default()
        };
        assert!(at_max.validate().is_ok());

        for ttl in [MAX_SESSION_TTL_SECONDS + 1, 10_000_000_000_000, u64::MAX] {
            let config = Config {
                session_ttl_seconds: ttl,
                ..Config::default()
            };
            assert!(matches!(
                config.validate(),
                Err(ConfigError::InvalidValue { ref key, .. }) if key == "SESSION_TTL_SECONDS"
            ));
        }
    }

    #[test]
    fn test_try_load_parses_default() {
        let port: u16 = try_load("TYPESPRINT_TEST_UNSET_PORT", "4242").unwrap();
        assert_eq!(port, 4242);
        let bad: Result<u16, _> = try_load("TYPESPRINT_TEST_UNSET_PORT", "not-a-port");
        assert!(bad.is_err());
    }
}

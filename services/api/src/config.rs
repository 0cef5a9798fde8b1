//! services/api/src/config.rs
//!
//! Defines the application's configuration structure and loading logic.
//!
//! All configuration is loaded from environment variables at startup. The `.env`
//! file is used for local development.

use chrono::FixedOffset;
use std::net::SocketAddr;
use std::path::PathBuf;
use tracing::Level;

pub const DEFAULT_STORAGE_KEY: &str = "navicampus-storage";

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Where the store snapshot is kept.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StorageBackend {
    /// One JSON document per storage key under `STORAGE_DIR`.
    File,
    /// A key/value table in the SQLite database at `DATABASE_URL`.
    Sqlite,
    /// Nothing survives a restart. Useful for demos.
    Memory,
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub bind_address: SocketAddr,
    pub log_level: Level,
    pub storage_backend: StorageBackend,
    pub storage_dir: PathBuf,
    pub storage_key: String,
    pub database_url: String,
    pub cors_origin: String,
    /// Offset used to project "now" onto the weekly timetable. `None` means the
    /// host's local time zone.
    pub campus_utc_offset: Option<FixedOffset>,
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// It will look for a `.env` file in the current directory for development,
    /// but this is skipped in test environments to ensure tests are hermetic.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Only load from .env in non-test mode to avoid contamination.
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        // --- Server Settings ---
        let bind_address_str = lookup("BIND_ADDRESS").unwrap_or_else(|| "127.0.0.1:3000".to_string());
        let bind_address = bind_address_str.parse::<SocketAddr>().map_err(|e| {
            ConfigError::InvalidValue("BIND_ADDRESS".to_string(), e.to_string())
        })?;

        let log_level_str = lookup("RUST_LOG").unwrap_or_else(|| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        let cors_origin =
            lookup("CORS_ORIGIN").unwrap_or_else(|| "http://localhost:8081".to_string());

        // --- Storage Settings ---
        let storage_backend = match lookup("STORAGE_BACKEND")
            .unwrap_or_else(|| "file".to_string())
            .to_lowercase()
            .as_str()
        {
            "file" => StorageBackend::File,
            "sqlite" => StorageBackend::Sqlite,
            "memory" => StorageBackend::Memory,
            other => {
                return Err(ConfigError::InvalidValue(
                    "STORAGE_BACKEND".to_string(),
                    format!("'{}' is not one of file, sqlite, memory", other),
                ))
            }
        };

        let storage_dir = lookup("STORAGE_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("./data"));

        let storage_key = lookup("STORAGE_KEY").unwrap_or_else(|| DEFAULT_STORAGE_KEY.to_string());
        if storage_key.is_empty()
            || !storage_key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            return Err(ConfigError::InvalidValue(
                "STORAGE_KEY".to_string(),
                "only ASCII letters, digits, '-' and '_' are allowed".to_string(),
            ));
        }

        let database_url = lookup("DATABASE_URL").unwrap_or_else(|| {
            format!(
                "sqlite://{}?mode=rwc",
                storage_dir.join("navicampus.db").display()
            )
        });

        // --- Timetable Settings ---
        let campus_utc_offset = match lookup("CAMPUS_UTC_OFFSET_MINUTES") {
            None => None,
            Some(raw) => {
                let invalid = || {
                    ConfigError::InvalidValue(
                        "CAMPUS_UTC_OFFSET_MINUTES".to_string(),
                        format!("'{}' is not a valid UTC offset in minutes", raw),
                    )
                };
                let minutes = raw.trim().parse::<i32>().map_err(|_| invalid())?;
                let offset = minutes
                    .checked_mul(60)
                    .and_then(FixedOffset::east_opt)
                    .ok_or_else(invalid)?;
                Some(offset)
            }
        };

        Ok(Self {
            bind_address,
            log_level,
            storage_backend,
            storage_dir,
            storage_key,
            database_url,
            cors_origin,
            campus_utc_offset,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_apply_when_unset() {
        let config = config_from(&[]).unwrap();
        assert_eq!(config.bind_address, "127.0.0.1:3000".parse().unwrap());
        assert_eq!(config.log_level, Level::INFO);
        assert_eq!(config.storage_backend, StorageBackend::File);
        assert_eq!(config.storage_key, DEFAULT_STORAGE_KEY);
        assert_eq!(config.storage_dir, PathBuf::from("./data"));
        assert!(config.database_url.starts_with("sqlite://"));
        assert!(config.campus_utc_offset.is_none());
    }

    #[test]
    fn explicit_values_are_used() {
        let config = config_from(&[
            ("BIND_ADDRESS", "0.0.0.0:8080"),
            ("RUST_LOG", "debug"),
            ("STORAGE_BACKEND", "SQLite"),
            ("DATABASE_URL", "sqlite::memory:"),
            ("CAMPUS_UTC_OFFSET_MINUTES", "330"),
        ])
        .unwrap();
        assert_eq!(config.bind_address.port(), 8080);
        assert_eq!(config.log_level, Level::DEBUG);
        assert_eq!(config.storage_backend, StorageBackend::Sqlite);
        assert_eq!(config.database_url, "sqlite::memory:");
        assert_eq!(config.campus_utc_offset, FixedOffset::east_opt(330 * 60));
    }

    #[test]
    fn invalid_values_are_rejected() {
        assert!(matches!(
            config_from(&[("BIND_ADDRESS", "nowhere")]),
            Err(ConfigError::InvalidValue(var, _)) if var == "BIND_ADDRESS"
        ));
        assert!(matches!(
            config_from(&[("STORAGE_BACKEND", "postgres")]),
            Err(ConfigError::InvalidValue(var, _)) if var == "STORAGE_BACKEND"
        ));
        assert!(matches!(
            config_from(&[("STORAGE_KEY", "../escape")]),
            Err(ConfigError::InvalidValue(var, _)) if var == "STORAGE_KEY"
        ));
        for offset in ["99999", "2147483647", "-2147483648", "five"] {
            assert!(matches!(
                config_from(&[("CAMPUS_UTC_OFFSET_MINUTES", offset)]),
                Err(ConfigError::InvalidValue(var, _)) if var == "CAMPUS_UTC_OFFSET_MINUTES"
            ));
        }
    }
}

//! Application configuration management.
//!
//! This module handles loading configuration from environment variables.
//! It uses the `envy` crate to automatically deserialize environment variables into a type-safe struct.

use serde::Deserialize;
use std::time::Duration;

/// Which storage backend the service runs against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// PostgreSQL through a sqlx connection pool
    Postgres,
    /// Process-local storage, lost on restart
    Memory,
}

/// Application configuration loaded from environment variables.
///
/// # Environment Variables
///
/// - `STORAGE_BACKEND` (optional): `postgres` (default) or `memory`
/// - `DATABASE_URL` (required for postgres): PostgreSQL connection string
/// - `DATABASE_MAX_CONNECTIONS` (optional): pool size, defaults to 5
/// - `SERVER_PORT` (optional): HTTP server port, defaults to 3000
/// - `EXCHANGE_RATE_API_URL` (optional): remote rate API; the simulated client is used when unset
/// - `EXCHANGE_TIMEOUT_MS` (optional): remote rate API timeout, defaults to 5000
/// - `EXCHANGE_LATENCY_MS` (optional): simulated client latency, defaults to 500
/// - `EXCHANGE_FAILURE_RATE` (optional): simulated client failure probability, defaults to 0.1
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default = "default_storage_backend")]
    pub storage_backend: StorageBackend,

    pub database_url: Option<String>,

    #[serde(default = "default_max_connections")]
    pub database_max_connections: u32,

    #[serde(default = "default_port")]
    pub server_port: u16,

    pub exchange_rate_api_url: Option<String>,

    #[serde(default = "default_exchange_timeout_ms")]
    pub exchange_timeout_ms: u64,

    #[serde(default = "default_exchange_latency_ms")]
    pub exchange_latency_ms: u64,

    #[serde(default = "default_exchange_failure_rate")]
    pub exchange_failure_rate: f64,
}

fn default_storage_backend() -> StorageBackend {
    StorageBackend::Postgres
}

fn default_max_connections() -> u32 {
    5
}

/// Default port if SERVER_PORT environment variable is not set.
fn default_port() -> u16 {
    3000
}

fn default_exchange_timeout_ms() -> u64 {
    5000
}

fn default_exchange_latency_ms() -> u64 {
    500
}

fn default_exchange_failure_rate() -> f64 {
    0.1
}

/// Configuration that parsed but cannot be used.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error(transparent)]
    Env(#[from] envy::Error),

    #[error("DATABASE_URL is required when STORAGE_BACKEND=postgres")]
    MissingDatabaseUrl,

    #[error("EXCHANGE_FAILURE_RATE must be between 0 and 1, got {0}")]
    InvalidFailureRate(f64),
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// This method first attempts to load a `.env` file (which is optional),
    /// then reads environment variables and deserializes them into a Config struct.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Environment variable values cannot be parsed into expected types
    /// - `DATABASE_URL` is missing while the postgres backend is selected
    /// - `EXCHANGE_FAILURE_RATE` is outside `[0, 1]`
    pub fn from_env() -> Result<Self, ConfigError> {
        // Try to load .env file if it exists (does nothing if not found)
        dotenvy::dotenv().ok();

        Self::from_vars(std::env::vars())
    }

    /// Build configuration from an explicit set of variables.
    pub fn from_vars<I>(vars: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let config = envy::from_iter::<_, Config>(vars)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.storage_backend == StorageBackend::Postgres && self.database_url.is_none() {
            return Err(ConfigError::MissingDatabaseUrl);
        }
        if !(0.0..=1.0).contains(&self.exchange_failure_rate) {
            return Err(ConfigError::InvalidFailureRate(self.exchange_failure_rate));
        }
        Ok(())
    }

    pub fn exchange_timeout(&self) -> Duration {
        Duration::from_millis(self.exchange_timeout_ms)
    }

    pub fn exchange_latency(&self) -> Duration {
        Duration::from_millis(self.exchange_latency_ms)
    }
}

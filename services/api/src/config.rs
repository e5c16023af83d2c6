//! services/api/src/config.rs
//!
//! Defines the application's configuration structure and loading logic.
//!
//! All configuration is loaded from environment variables at startup. The `.env`
//! file is used for local development.

use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;
use tracing::Level;

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub bind_address: SocketAddr,
    /// When unset the service runs against the built-in mock catalog.
    pub database_url: Option<String>,
    pub log_level: Level,
    pub openai_api_key: Option<String>,
    pub intent_model: String,
    pub cors_origin: String,
    pub cook: CookSettings,
}

/// Timing knobs for the cooking subsystem.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CookSettings {
    /// Period of one timer tick.
    pub tick: Duration,
    /// How long a stopped session stays readable before it is removed.
    pub stop_grace: Duration,
    /// Sessions untouched for longer than this are reaped.
    pub idle_ttl: Duration,
    pub reap_interval: Duration,
    pub keepalive: Duration,
}

impl Default for CookSettings {
    fn default() -> Self {
        Self {
            tick: Duration::from_secs(1),
            stop_grace: Duration::from_secs(60),
            idle_ttl: Duration::from_secs(4 * 60 * 60),
            reap_interval: Duration::from_secs(5 * 60),
            keepalive: Duration::from_secs(15),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_address: SocketAddr::from(([0, 0, 0, 0], 3000)),
            database_url: None,
            log_level: Level::INFO,
            openai_api_key: None,
            intent_model: "gpt-4o-mini".to_string(),
            cors_origin: "http://localhost:3000".to_string(),
            cook: CookSettings::default(),
        }
    }
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
        let defaults = Config::default();

        // --- Load Server and Database Settings ---
        let bind_address = parse_var("BIND_ADDRESS", defaults.bind_address)?;
        let database_url = std::env::var("DATABASE_URL")
            .ok()
            .filter(|url| !url.trim().is_empty());

        let log_level_str = std::env::var("RUST_LOG").unwrap_or_else(|_| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        // --- Load API Keys (as optional) ---
        let openai_api_key = std::env::var("OPENAI_API_KEY").ok();
        let intent_model = std::env::var("INTENT_MODEL").unwrap_or(defaults.intent_model);
        let cors_origin = std::env::var("CORS_ORIGIN").unwrap_or(defaults.cors_origin);

        // --- Load Cooking Timings ---
        let cook = CookSettings {
            tick: Duration::from_millis(parse_var("COOK_TICK_MILLIS", 1000u64)?),
            stop_grace: Duration::from_secs(parse_var("COOK_STOP_GRACE_SECS", 60u64)?),
            idle_ttl: Duration::from_secs(parse_var("COOK_IDLE_TTL_SECS", 14_400u64)?),
            reap_interval: Duration::from_secs(parse_var("COOK_REAP_INTERVAL_SECS", 300u64)?),
            keepalive: Duration::from_secs(parse_var("KEEPALIVE_SECS", 15u64)?),
        };
        for (key, value) in [
            ("COOK_TICK_MILLIS", cook.tick),
            ("COOK_REAP_INTERVAL_SECS", cook.reap_interval),
            ("KEEPALIVE_SECS", cook.keepalive),
        ] {
            if value.is_zero() {
                return Err(ConfigError::InvalidValue(
                    key.to_string(),
                    "must be greater than zero".to_string(),
                ));
            }
        }

        Ok(Self {
            bind_address,
            database_url,
            log_level,
            openai_api_key,
            intent_model,
            cors_origin,
            cook,
        })
    }
}

/// Reads and parses an optional variable, falling back to `default` when unset.
fn parse_var<T>(key: &str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|e| ConfigError::InvalidValue(key.to_string(), e.to_string())),
        Err(_) => Ok(default),
    }
}

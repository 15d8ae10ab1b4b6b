//! Configuration loader for the `airsight-analytics` service.
//!
//! All runtime settings are read once from environment variables (with
//! optional `.env` support provided by the caller) into an immutable
//! [`Config`], so no other module calls `env::var` directly.
use std::{env, path::PathBuf};

use anyhow::{anyhow, Result};

/// Parse an optional unsigned integer environment variable with a default value.
macro_rules! parse_env {
    ($var_name:expr, $ty:ty, $default:expr) => {
        env::var($var_name)
            .ok()
            .map(|v| v.trim().parse::<$ty>())
            .transpose()
            .map_err(|e| anyhow!("Invalid {}: {}", $var_name, e))?
            .unwrap_or($default)
    };
}

/// Parse a required string environment variable.
macro_rules! require_env {
    ($var_name:expr) => {
        env::var($var_name)
            .map_err(|_| anyhow!("{} must be set in .env or environment", $var_name))?
    };
}

/// Strongly typed application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    // ---
    /// PostgreSQL connection string.
    pub db_url: String,

    /// Maximum number of database connections in the pool.
    pub db_pool_max: u32,

    /// HTTP listen port.
    pub port: u16,

    /// Length of the trailing window used when a request names no dates.
    pub default_window_days: u32,

    /// JSON file of readings loaded into an empty `aqi_data` table at start-up.
    pub seed_file: Option<PathBuf>,
}

/// Load configuration from environment variables with defaults.
///
/// Required:
/// - `DATABASE_URL` – PostgreSQL connection string
///
/// Optional:
/// - `DB_POOL_MAX` – max DB connections (default: 5)
/// - `ANALYTICS_PORT` – HTTP port (default: 8080)
/// - `ANALYTICS_DEFAULT_WINDOW_DAYS` – default query window (default: 30)
/// - `SEED_READINGS_FILE` – readings to seed an empty database with
pub fn load_from_env() -> Result<Config> {
    // ---
    let db_url = require_env!("DATABASE_URL");
    let db_pool_max = parse_env!("DB_POOL_MAX", u32, 5);
    let port = parse_env!("ANALYTICS_PORT", u16, 8080);
    let default_window_days = parse_env!("ANALYTICS_DEFAULT_WINDOW_DAYS", u32, 30);
    let seed_file = env::var("SEED_READINGS_FILE")
        .ok()
        .filter(|v| !v.trim().is_empty())
        .map(PathBuf::from);

    if default_window_days == 0 {
        return Err(anyhow!("Invalid ANALYTICS_DEFAULT_WINDOW_DAYS: must be at least 1"));
    }

    Ok(Config {
        db_url,
        db_pool_max,
        port,
        default_window_days,
        seed_file,
    })
}

impl Config {
    // ---
    /// Database URL with the password replaced by `****`.
    pub fn masked_db_url(&self) -> String {
        // ---
        if let Some(at_pos) = self.db_url.rfind('@') {
            if let Some(colon_pos) = self.db_url[..at_pos].rfind(':') {
                // `postgres://user@host` has its only colon in the scheme
                if !self.db_url[colon_pos..].starts_with("://") {
                    return format!(
                        "{}:****{}",
                        &self.db_url[..colon_pos],
                        &self.db_url[at_pos..]
                    );
                }
            }
        }
        self.db_url.clone()
    }

    /// Log the loaded configuration, masking the database password.
    pub fn log_config(&self) {
        // ---
        tracing::info!("Configuration loaded:");
        tracing::info!("  DATABASE_URL                  : {}", self.masked_db_url());
        tracing::info!("  DB_POOL_MAX                   : {}", self.db_pool_max);
        tracing::info!("  ANALYTICS_PORT                : {}", self.port);
        tracing::info!("  ANALYTICS_DEFAULT_WINDOW_DAYS : {}", self.default_window_days);
        tracing::info!("  SEED_READINGS_FILE            : {:?}", self.seed_file);
    }
}

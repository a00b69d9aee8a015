//! Configuration loader for the `ktw-its` service.
//!
//! This module centralizes all runtime configuration values and their defaults,
//! loading from environment variables (with optional `.env` file support
//! provided by the caller). By consolidating configuration logic here, we
//! avoid scattering `env::var` calls throughout the codebase.
//!
use std::env;

use anyhow::{anyhow, Result};

/// Base URL of the Katowice ITS open-data API.
pub const DEFAULT_API_URL: &str = "https://its.katowice.eu";

/// Parse an optional integer environment variable with a default value.
macro_rules! parse_env_u32 {
    ($var_name:expr, $default:expr) => {
        env::var($var_name)
            .ok()
            .map(|v| v.parse::<u32>())
            .transpose()
            .map_err(|e| anyhow!("Invalid {}: {}", $var_name, e))?
            .unwrap_or($default)
    };
}

/// Parse an optional string environment variable with a default value.
macro_rules! env_or {
    ($var_name:expr, $default:expr) => {
        env::var($var_name).unwrap_or_else(|_| $default.to_string())
    };
}

/// Strongly typed application configuration.
///
/// All fields are immutable after loading, ensuring a consistent configuration
/// snapshot for the lifetime of the application.
#[derive(Debug, Clone)]
pub struct Config {
    // ---
    /// ITS open-data API base URL.
    pub api_url: String,

    /// Seconds between two scheduled `fetch_data` cycles.
    pub poll_interval_secs: u32,

    /// Transport timeout of every HTTP request, in seconds.
    pub http_timeout_secs: u32,

    /// Port of the HTTP adapter.
    pub listen_port: u16,

    /// Entity ids whose position changes are matched against parking zones.
    pub tracked_entities: Vec<String>,
}

/// Load configuration from environment variables with defaults.
///
/// Optional:
/// - `ITS_API_URL` – API base URL (default: https://its.katowice.eu)
/// - `POLL_INTERVAL_SECS` – scheduler period (default: 60)
/// - `HTTP_TIMEOUT_SECS` – request timeout (default: 30)
/// - `LISTEN_PORT` – HTTP adapter port (default: 8080)
/// - `TRACKED_ENTITIES` – comma-separated entity ids (default: none)
///
/// Returns an error if any variable is present but invalid.
pub fn load_from_env() -> Result<Config> {
    // ---
    let api_url = env_or!("ITS_API_URL", DEFAULT_API_URL);
    let poll_interval_secs = parse_env_u32!("POLL_INTERVAL_SECS", 60);
    let http_timeout_secs = parse_env_u32!("HTTP_TIMEOUT_SECS", 30);
    let listen_port = u16::try_from(parse_env_u32!("LISTEN_PORT", 8080))
        .map_err(|e| anyhow!("Invalid LISTEN_PORT: {}", e))?;
    let tracked_entities = parse_tracked_entities(&env_or!("TRACKED_ENTITIES", ""));

    if poll_interval_secs == 0 {
        return Err(anyhow!("POLL_INTERVAL_SECS must be greater than zero"));
    }

    Ok(Config {
        api_url,
        poll_interval_secs,
        http_timeout_secs,
        listen_port,
        tracked_entities,
    })
}

/// Split a comma-separated id list, dropping blanks and duplicates.
pub fn parse_tracked_entities(raw: &str) -> Vec<String> {
    // ---
    let mut ids: Vec<String> = Vec::new();
    for id in raw.split(',').map(str::trim).filter(|id| !id.is_empty()) {
        if !ids.iter().any(|known| known == id) {
            ids.push(id.to_string());
        }
    }
    ids
}

impl Config {
    /// Log the loaded configuration for debugging purposes.
    pub fn log_config(&self) {
        // ---
        let tracked = if self.tracked_entities.is_empty() {
            "(none)".to_string()
        } else {
            self.tracked_entities.join(", ")
        };

        tracing::info!("Configuration loaded:");
        tracing::info!("  ITS_API_URL        : {}", self.api_url);
        tracing::info!("  POLL_INTERVAL_SECS : {}", self.poll_interval_secs);
        tracing::info!("  HTTP_TIMEOUT_SECS  : {}", self.http_timeout_secs);
        tracing::info!("  LISTEN_PORT        : {}", self.listen_port);
        tracing::info!("  TRACKED_ENTITIES   : {}", tracked);
    }
}

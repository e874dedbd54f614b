use std::env;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

pub const DEFAULT_REFRESH_SECS: u64 = 60;
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 15;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{name} must be a whole number of seconds, got {value:?}")]
    InvalidNumber { name: &'static str, value: String },

    #[error("{0} must be greater than zero")]
    Zero(&'static str),

    #[error("Cannot determine a {0} directory; set {1}")]
    NoDirectory(&'static str, &'static str),
}

#[derive(Debug, Clone, PartialEq)]
pub struct DashboardConfig {
    // Endpoints
    pub market_url: String,
    pub insight_url: String,

    // Timing
    pub refresh_interval: Duration,
    pub http_timeout: Duration,

    // Files
    pub credentials_file: PathBuf,
    pub log_file: PathBuf,

    // Optional key seeds, written into the credential store on startup
    pub market_key_seed: Option<String>,
    pub insight_key_seed: Option<String>,
}

impl DashboardConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Build from an arbitrary variable lookup; empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let credentials_file = match var("COINBOARD_CREDENTIALS_FILE") {
            Some(path) => PathBuf::from(path),
            None => dirs::config_dir()
                .ok_or(ConfigError::NoDirectory("config", "COINBOARD_CREDENTIALS_FILE"))?
                .join("coinboard")
                .join("credentials.json"),
        };
        let log_file = match var("COINBOARD_LOG_FILE") {
            Some(path) => PathBuf::from(path),
            None => dirs::data_local_dir()
                .or_else(dirs::cache_dir)
                .ok_or(ConfigError::NoDirectory("data", "COINBOARD_LOG_FILE"))?
                .join("coinboard")
                .join("coinboard.log"),
        };

        Ok(Self {
            market_url: var("COINBOARD_MARKET_URL")
                .unwrap_or_else(|| coingecko_client::DEFAULT_MARKETS_URL.to_string()),
            insight_url: var("COINBOARD_INSIGHT_URL")
                .unwrap_or_else(|| insight_client::DEFAULT_INSIGHT_URL.to_string()),
            refresh_interval: Duration::from_secs(seconds(
                "COINBOARD_REFRESH_SECS",
                var("COINBOARD_REFRESH_SECS"),
                DEFAULT_REFRESH_SECS,
            )?),
            http_timeout: Duration::from_secs(seconds(
                "COINBOARD_HTTP_TIMEOUT_SECS",
                var("COINBOARD_HTTP_TIMEOUT_SECS"),
                DEFAULT_HTTP_TIMEOUT_SECS,
            )?),
            credentials_file,
            log_file,
            market_key_seed: var("COINGECKO_API_KEY"),
            insight_key_seed: var("GEMINI_API_KEY"),
        })
    }
}

fn seconds(name: &'static str, raw: Option<String>, default: u64) -> Result<u64, ConfigError> {
    let value = match raw {
        None => default,
        Some(v) => v
            .parse()
            .map_err(|_| ConfigError::InvalidNumber { name, value: v })?,
    };
    if value == 0 {
        return Err(ConfigError::Zero(name));
    }
    Ok(value)
}

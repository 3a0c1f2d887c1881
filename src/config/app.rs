//! Main application configuration
//!
//! This module defines the primary configuration structures for bracket-rank,
//! including environment variable loading, TOML file loading and validation.

use crate::config::rating::RatingConfig;
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Main application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub service: ServiceSettings,
    pub paths: PathSettings,
    pub challonge: ChallongeSettings,
    pub rating: RatingConfig,
}

/// Service-level settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceSettings {
    /// Service name for logging and metrics
    pub name: String,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
}

/// Locations of every file the pipeline reads or writes
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PathSettings {
    /// Alias table, one `raw * canonical` pair per line
    pub alias_file: PathBuf,
    /// Known tournaments, one identifier per line
    pub tournaments_file: PathBuf,
    /// Two-line credential file: username, then API key
    pub credentials_file: PathBuf,
    /// Persisted aggregation state
    pub state_file: PathBuf,
    /// Directory receiving `scores.csv` and `wins.csv`
    pub stats_dir: PathBuf,
}

/// Tournament API connection settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChallongeSettings {
    /// API base url, without trailing slash
    pub base_url: String,
    /// Per-request timeout in seconds
    pub request_timeout_seconds: u64,
    /// Username override; takes precedence over the credential file
    pub username: Option<String>,
    /// API key override; takes precedence over the credential file
    pub api_key: Option<String>,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            name: "bracket-rank".to_string(),
            log_level: "info".to_string(),
        }
    }
}

impl Default for PathSettings {
    fn default() -> Self {
        Self {
            alias_file: PathBuf::from("names/players.txt"),
            tournaments_file: PathBuf::from("names/tournaments.txt"),
            credentials_file: PathBuf::from("names/credentials.txt"),
            state_file: PathBuf::from("data/state.json"),
            stats_dir: PathBuf::from("stats"),
        }
    }
}

impl Default for ChallongeSettings {
    fn default() -> Self {
        Self {
            base_url: "https://api.challonge.com/v1".to_string(),
            request_timeout_seconds: 30,
            username: None,
            api_key: None,
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables with fallback to defaults
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        config.apply_env()?;
        validate_config(&config)?;
        Ok(config)
    }

    /// Load configuration from a TOML file, then apply environment overrides
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let mut config: AppConfig = toml::from_str(&raw)
            .map_err(|e| anyhow!("Invalid config file {}: {}", path.display(), e))?;
        config.apply_env()?;
        validate_config(&config)?;
        Ok(config)
    }

    fn apply_env(&mut self) -> Result<()> {
        // Service settings
        if let Ok(name) = env::var("SERVICE_NAME") {
            self.service.name = name;
        }
        if let Ok(log_level) = env::var("LOG_LEVEL") {
            self.service.log_level = log_level;
        }

        // Path settings
        if let Ok(path) = env::var("BRACKET_ALIAS_FILE") {
            self.paths.alias_file = PathBuf::from(path);
        }
        if let Ok(path) = env::var("BRACKET_TOURNAMENTS_FILE") {
            self.paths.tournaments_file = PathBuf::from(path);
        }
        if let Ok(path) = env::var("BRACKET_CREDENTIALS_FILE") {
            self.paths.credentials_file = PathBuf::from(path);
        }
        if let Ok(path) = env::var("BRACKET_STATE_FILE") {
            self.paths.state_file = PathBuf::from(path);
        }
        if let Ok(path) = env::var("BRACKET_STATS_DIR") {
            self.paths.stats_dir = PathBuf::from(path);
        }

        // Challonge settings
        if let Ok(url) = env::var("CHALLONGE_BASE_URL") {
            self.challonge.base_url = url;
        }
        if let Ok(timeout) = env::var("CHALLONGE_TIMEOUT_SECONDS") {
            self.challonge.request_timeout_seconds = timeout
                .parse()
                .map_err(|_| anyhow!("Invalid CHALLONGE_TIMEOUT_SECONDS value: {}", timeout))?;
        }
        if let Ok(username) = env::var("CHALLONGE_USERNAME") {
            self.challonge.username = Some(username);
        }
        if let Ok(api_key) = env::var("CHALLONGE_API_KEY") {
            self.challonge.api_key = Some(api_key);
        }

        // Rating settings
        if let Ok(sort) = env::var("BRACKET_SORT_BY_SCORE") {
            self.rating.sort_by_score = sort
                .parse()
                .map_err(|_| anyhow!("Invalid BRACKET_SORT_BY_SCORE value: {}", sort))?;
        }

        Ok(())
    }

    /// Get the API request timeout as Duration
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.challonge.request_timeout_seconds)
    }
}

/// Validate configuration values
pub fn validate_config(config: &AppConfig) -> Result<()> {
    // Validate log level
    match config.service.log_level.to_lowercase().as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => {}
        _ => return Err(anyhow!("Invalid log level: {}", config.service.log_level)),
    }

    // Validate API settings
    if config.challonge.base_url.is_empty() {
        return Err(anyhow!("Challonge base url cannot be empty"));
    }
    if config.challonge.request_timeout_seconds == 0 {
        return Err(anyhow!("Request timeout must be greater than 0"));
    }

    // Validate paths
    if config.paths.state_file.as_os_str().is_empty() {
        return Err(anyhow!("State file path cannot be empty"));
    }
    if config.paths.stats_dir.as_os_str().is_empty() {
        return Err(anyhow!("Stats directory cannot be empty"));
    }

    config.rating.trueskill.validate()?;

    Ok(())
}

//! Configuration management
//!
//! Configuration is read from `config.yml` and can be overridden through
//! `VISHWAVANI_*` environment variables. Missing sections and keys fall back
//! to defaults, so an absent or empty file yields a runnable configuration.

use serde::{Deserialize, Serialize};

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// HTTP server configuration
    #[serde(default)]
    pub server: ServerConfig,
    /// Database configuration
    #[serde(default)]
    pub database: DatabaseConfig,
    /// Cache configuration
    #[serde(default)]
    pub cache: CacheConfig,
    /// Ranking and listing configuration
    #[serde(default)]
    pub ranking: RankingConfig,
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Host address to bind to
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to listen on
    #[serde(default = "default_port")]
    pub port: u16,
    /// CORS allowed origin for the public site
    #[serde(default = "default_cors_origin")]
    pub cors_origin: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_origin: default_cors_origin(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_cors_origin() -> String {
    "http://localhost:3000".to_string()
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// SQLite file path, `sqlite:` URL, or `:memory:`
    #[serde(default = "default_database_url")]
    pub url: String,
    /// Maximum pooled connections
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: default_database_url(),
            max_connections: default_max_connections(),
        }
    }
}

fn default_database_url() -> String {
    "data/vishwavani.db".to_string()
}

fn default_max_connections() -> u32 {
    20
}

/// Cache configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Cache driver (memory or none)
    #[serde(default)]
    pub driver: CacheDriver,
    /// Maximum number of cached entries
    #[serde(default = "default_capacity")]
    pub capacity: u64,
    /// Cache TTL in seconds
    #[serde(default = "default_ttl")]
    pub ttl_seconds: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            driver: CacheDriver::default(),
            capacity: default_capacity(),
            ttl_seconds: default_ttl(),
        }
    }
}

fn default_capacity() -> u64 {
    10_000
}

fn default_ttl() -> u64 {
    300
}

/// Cache driver type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum CacheDriver {
    /// In-process moka cache (default)
    #[default]
    Memory,
    /// Caching disabled, every read goes to the database
    #[serde(rename = "none")]
    Disabled,
}

/// Ranking and listing configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankingConfig {
    /// Items per page for browsing listings
    #[serde(default = "default_page_size")]
    pub page_size: u32,
    /// Trailing window for trending, in days
    #[serde(default = "default_trending_window_days")]
    pub trending_window_days: u32,
    /// Default limit for trending/breaking/featured strips
    #[serde(default = "default_limit")]
    pub default_limit: u32,
    /// Default number of related articles
    #[serde(default = "default_related_limit")]
    pub related_limit: u32,
    /// Interval between background counter refreshes, 0 disables
    #[serde(default = "default_refresh_interval_secs")]
    pub refresh_interval_secs: u64,
}

impl Default for RankingConfig {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
            trending_window_days: default_trending_window_days(),
            default_limit: default_limit(),
            related_limit: default_related_limit(),
            refresh_interval_secs: default_refresh_interval_secs(),
        }
    }
}

fn default_page_size() -> u32 {
    12
}

fn default_trending_window_days() -> u32 {
    7
}

fn default_limit() -> u32 {
    5
}

fn default_related_limit() -> u32 {
    3
}

fn default_refresh_interval_secs() -> u64 {
    300
}

/// Error type for configuration parsing
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    FileRead {
        path: String,
        source: std::io::Error,
    },
    #[error("Failed to parse config file '{path}': {message}")]
    ParseError { path: String, message: String },
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

impl Config {
    /// Load configuration from file
    ///
    /// A missing or empty file yields the default configuration. Invalid YAML
    /// is reported with its line and column.
    pub fn load(path: &std::path::Path) -> anyhow::Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::FileRead {
            path: path.display().to_string(),
            source: e,
        })?;

        if content.trim().is_empty() {
            return Ok(Self::default());
        }

        let config: Config = serde_yaml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.display().to_string(),
            message: format_yaml_error(&e),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from file with environment variable overrides
    ///
    /// Recognised variables:
    /// - VISHWAVANI_SERVER_HOST, VISHWAVANI_SERVER_PORT, VISHWAVANI_SERVER_CORS_ORIGIN
    /// - VISHWAVANI_DATABASE_URL, VISHWAVANI_DATABASE_MAX_CONNECTIONS
    /// - VISHWAVANI_CACHE_DRIVER, VISHWAVANI_CACHE_TTL_SECONDS
    /// - VISHWAVANI_RANKING_PAGE_SIZE, VISHWAVANI_RANKING_TRENDING_WINDOW_DAYS
    /// - VISHWAVANI_RANKING_REFRESH_INTERVAL_SECS
    pub fn load_with_env(path: &std::path::Path) -> anyhow::Result<Self> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Reject values that would make listings or pools unusable
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.ranking.page_size == 0 {
            return Err(ConfigError::ValidationError(
                "ranking.page_size must be greater than 0".to_string(),
            ));
        }
        if self.ranking.trending_window_days == 0 {
            return Err(ConfigError::ValidationError(
                "ranking.trending_window_days must be greater than 0".to_string(),
            ));
        }
        if self.database.max_connections == 0 {
            return Err(ConfigError::ValidationError(
                "database.max_connections must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(host) = std::env::var("VISHWAVANI_SERVER_HOST") {
            self.server.host = host;
        }
        if let Some(port) = env_parse::<u16>("VISHWAVANI_SERVER_PORT") {
            self.server.port = port;
        }
        if let Ok(origin) = std::env::var("VISHWAVANI_SERVER_CORS_ORIGIN") {
            self.server.cors_origin = origin;
        }

        if let Ok(url) = std::env::var("VISHWAVANI_DATABASE_URL") {
            self.database.url = url;
        }
        if let Some(max) = env_parse::<u32>("VISHWAVANI_DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections = max;
        }

        if let Ok(driver) = std::env::var("VISHWAVANI_CACHE_DRIVER") {
            match driver.to_lowercase().as_str() {
                "memory" => self.cache.driver = CacheDriver::Memory,
                "none" => self.cache.driver = CacheDriver::Disabled,
                _ => {} // Ignore invalid values
            }
        }
        if let Some(ttl) = env_parse::<u64>("VISHWAVANI_CACHE_TTL_SECONDS") {
            self.cache.ttl_seconds = ttl;
        }

        if let Some(size) = env_parse::<u32>("VISHWAVANI_RANKING_PAGE_SIZE") {
            self.ranking.page_size = size;
        }
        if let Some(days) = env_parse::<u32>("VISHWAVANI_RANKING_TRENDING_WINDOW_DAYS") {
            self.ranking.trending_window_days = days;
        }
        if let Some(secs) = env_parse::<u64>("VISHWAVANI_RANKING_REFRESH_INTERVAL_SECS") {
            self.ranking.refresh_interval_secs = secs;
        }
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.parse::<T>().ok())
}

/// Format YAML parsing error with location and context
fn format_yaml_error(e: &serde_yaml::Error) -> String {
    if let Some(location) = e.location() {
        format!(
            "at line {}, column {}: {}",
            location.line(),
            location.column(),
            e
        )
    } else {
        e.to_string()
    }
}

// Shared by every test that touches VISHWAVANI_* variables.
#[cfg(test)]
static CONFIG_ENV_MUTEX: std::sync::Mutex<()> = std::sync::Mutex::new(());

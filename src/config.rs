//! Configuration management for Stride Tracker
//!
//! Handles environment variables and application settings.

use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;
use url::Url;

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Server bind address
    pub host: String,

    /// Server port
    pub port: u16,

    /// Database URL
    pub database_url: String,

    /// Data directory for SQLite database
    pub data_dir: PathBuf,

    /// Base URL of the remote account/session backend
    pub api_base_url: String,

    /// Environment (development, production)
    pub environment: String,

    /// Log level
    pub log_level: String,

    /// IANA timezone used for local times in exported tracks
    pub timezone: String,

    /// Stopwatch tick interval in milliseconds
    pub tick_interval_ms: u64,

    /// Backend request timeout in seconds
    pub request_timeout: u64,

    /// CORS origins (empty means allow all)
    pub cors_origins: Vec<String>,

    /// Whether the host granted location access
    pub location_permission: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
            database_url: "sqlite:stride-tracker.db".to_string(),
            data_dir: PathBuf::from("./data"),
            api_base_url: "http://localhost:8080/api".to_string(),
            environment: "development".to_string(),
            log_level: "info".to_string(),
            timezone: "UTC".to_string(),
            tick_interval_ms: 1,
            request_timeout: 30,
            cors_origins: vec![],
            location_permission: true,
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();

        // Server configuration
        if let Ok(host) = env::var("STRIDE_HOST") {
            config.host = host;
        }

        if let Ok(port) = env::var("STRIDE_PORT") {
            config.port = port.parse().map_err(|_| ConfigError::InvalidPort(port))?;
        }

        // Storage
        if let Ok(database_url) = env::var("STRIDE_DATABASE_URL") {
            config.database_url = database_url;
        }

        if let Ok(data_dir) = env::var("STRIDE_DATA_DIR") {
            config.data_dir = PathBuf::from(data_dir);
        }

        // Remote backend
        if let Ok(api_base_url) = env::var("STRIDE_API_BASE_URL") {
            config.api_base_url = api_base_url;
        }

        if let Ok(timeout) = env::var("STRIDE_REQUEST_TIMEOUT") {
            config.request_timeout = timeout
                .parse()
                .map_err(|_| ConfigError::InvalidRequestTimeout(timeout))?;
        }

        // Environment and logging
        if let Ok(environment) = env::var("STRIDE_ENVIRONMENT") {
            config.environment = environment;
        }

        if let Ok(log_level) = env::var("STRIDE_LOG_LEVEL") {
            config.log_level = log_level;
        }

        // Tracking
        if let Ok(timezone) = env::var("STRIDE_TIMEZONE") {
            config.timezone = timezone;
        }

        if let Ok(tick) = env::var("STRIDE_TICK_INTERVAL_MS") {
            config.tick_interval_ms = tick.parse().map_err(|_| ConfigError::InvalidTickInterval(tick))?;
        }

        if let Ok(permission) = env::var("STRIDE_LOCATION_PERMISSION") {
            config.location_permission = permission
                .parse()
                .map_err(|_| ConfigError::InvalidBool(permission))?;
        }

        // CORS origins
        if let Ok(cors_origins) = env::var("STRIDE_CORS_ORIGINS") {
            config.cors_origins = cors_origins
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
        }

        config.validate()?;

        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.port == 0 {
            return Err(ConfigError::InvalidPort(self.port.to_string()));
        }

        if self.database_url.is_empty() {
            return Err(ConfigError::EmptyDatabaseUrl);
        }

        if self.data_dir.as_os_str().is_empty() {
            return Err(ConfigError::EmptyDataDir);
        }

        Url::parse(&self.api_base_url).map_err(|_| ConfigError::InvalidApiBaseUrl(self.api_base_url.clone()))?;

        self.tz()?;

        if self.tick_interval_ms == 0 {
            return Err(ConfigError::InvalidTickInterval(self.tick_interval_ms.to_string()));
        }

        if self.request_timeout == 0 {
            return Err(ConfigError::InvalidRequestTimeout(self.request_timeout.to_string()));
        }

        Ok(())
    }

    /// Get server bind address
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Check if running in production mode
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    /// Parsed export timezone
    pub fn tz(&self) -> Result<Tz, ConfigError> {
        self.timezone
            .parse::<Tz>()
            .map_err(|_| ConfigError::InvalidTimezone(self.timezone.clone()))
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout)
    }

    /// Create data directory if it doesn't exist
    pub fn ensure_data_dir(&self) -> Result<(), ConfigError> {
        std::fs::create_dir_all(&self.data_dir).map_err(|e| ConfigError::DataDirCreationFailed(e.to_string()))?;
        Ok(())
    }

    /// Connection URL with relative SQLite paths resolved against the data directory
    pub fn resolved_database_url(&self) -> String {
        match self.database_url.strip_prefix("sqlite:") {
            Some(path) if !path.starts_with(':') && PathBuf::from(path).is_relative() => {
                format!("sqlite:{}", self.data_dir.join(path).display())
            }
            _ => self.database_url.clone(),
        }
    }

    /// Log configuration
    pub fn log_config(&self) {
        info!("Configuration loaded:");
        info!("  Environment: {}", self.environment);
        info!("  Bind address: {}", self.bind_address());
        info!("  Database URL: {}", self.resolved_database_url());
        info!("  Backend API: {}", self.api_base_url);
        info!("  Timezone: {}", self.timezone);
        info!("  Tick interval: {}ms", self.tick_interval_ms);
        info!("  Request timeout: {}s", self.request_timeout);
        info!("  CORS origins: {:?}", self.cors_origins);
        info!("  Location permission: {}", self.location_permission);
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid port: {0}")]
    InvalidPort(String),

    #[error("Invalid request timeout: {0}")]
    InvalidRequestTimeout(String),

    #[error("Invalid tick interval: {0}")]
    InvalidTickInterval(String),

    #[error("Invalid boolean value: {0}")]
    InvalidBool(String),

    #[error("Invalid backend URL: {0}")]
    InvalidApiBaseUrl(String),

    #[error("Unknown timezone: {0}")]
    InvalidTimezone(String),

    #[error("Empty database URL")]
    EmptyDatabaseUrl,

    #[error("Empty data directory")]
    EmptyDataDir,

    #[error("Data directory creation failed: {0}")]
    DataDirCreationFailed(String),
}

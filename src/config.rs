//! Configuration management for the ToFit engine
//!
//! Provides strongly-typed configuration with validation, environment variable parsing,
//! and sensible defaults. Supports both development and production environments.
//!
//! # Example
//! ```no_run
//! use tofit::Config;
//! let config = Config::from_env().expect("failed to load config");
//! println!("Top-N: {}", config.recommendation.top_n);
//! ```

use crate::error::{Error, Result};
use crate::recommendation::engine::DEFAULT_TOP_N;
use std::time::Duration;
use tracing::info;

/// Default number of completed bookings fed to the history analyzer
pub const DEFAULT_HISTORY_LIMIT: usize = 10;

/// Main application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Database configuration
    pub database: DatabaseConfig,
    /// API server configuration
    pub api: ApiConfig,
    /// Recommendation engine configuration
    pub recommendation: RecommendationConfig,
    /// Log output configuration
    pub logging: LoggingConfig,
}

/// Database configuration
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL
    pub url: String,
    /// Maximum connections in pool
    pub max_connections: u32,
    /// Minimum connections to keep open
    pub min_connections: u32,
    /// Connection timeout
    pub connect_timeout: Duration,
    /// Idle timeout for connections
    pub idle_timeout: Duration,
    /// Maximum lifetime for connections
    pub max_lifetime: Duration,
    /// Enable statement caching
    pub statement_cache_size: usize,
}

/// API server configuration
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Port to listen on
    pub port: u16,
    /// Host to bind to
    pub host: String,
    /// Request timeout
    pub request_timeout: Duration,
    /// Enable CORS
    pub cors_enabled: bool,
    /// Allowed origins for CORS
    pub cors_origins: Vec<String>,
}

/// Recommendation engine configuration
#[derive(Debug, Clone)]
pub struct RecommendationConfig {
    /// How many scored items a recommendation call returns
    pub top_n: usize,
    /// How many completed bookings are analyzed per user
    pub history_limit: usize,
    /// Runs slower than this are logged at warn level
    pub slow_threshold: Duration,
}

impl Default for RecommendationConfig {
    fn default() -> Self {
        Self {
            top_n: DEFAULT_TOP_N,
            history_limit: DEFAULT_HISTORY_LIMIT,
            slow_threshold: Duration::from_millis(50),
        }
    }
}

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Compact,
    Json,
}

impl std::str::FromStr for LogFormat {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" | "pretty" | "text" => Ok(Self::Compact),
            "json" => Ok(Self::Json),
            other => Err(Error::InvalidConfig {
                key: "LOG_FORMAT",
                message: format!("unsupported log format `{other}` (expected compact|json)")
                    .into(),
            }),
        }
    }
}

/// Log output configuration
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub format: LogFormat,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Try to load .env file (ignore if not found)
        dotenvy::dotenv().ok();

        let config = Self {
            database: DatabaseConfig::from_env()?,
            api: ApiConfig::from_env()?,
            recommendation: RecommendationConfig::from_env()?,
            logging: LoggingConfig::from_env()?,
        };

        config.validate()?;

        Ok(config)
    }

    /// Validate configuration
    fn validate(&self) -> Result<()> {
        if self.database.url.is_empty() {
            return Err(Error::InvalidConfig {
                key: "DATABASE_URL",
                message: "database URL cannot be empty".into(),
            });
        }

        if self.database.max_connections < self.database.min_connections {
            return Err(Error::InvalidConfig {
                key: "DB_MAX_CONNECTIONS",
                message: "max_connections must be >= min_connections".into(),
            });
        }

        if self.recommendation.top_n == 0 {
            return Err(Error::InvalidConfig {
                key: "REC_TOP_N",
                message: "top_n must be at least 1".into(),
            });
        }

        if self.recommendation.history_limit == 0 {
            return Err(Error::InvalidConfig {
                key: "REC_HISTORY_LIMIT",
                message: "history_limit must be at least 1".into(),
            });
        }

        Ok(())
    }

    /// Log configuration summary (without sensitive data)
    pub fn log_summary(&self) {
        info!("Configuration loaded:");
        info!("  Database:");
        info!("    URL: {}", mask_url(&self.database.url));
        info!(
            "    Pool Size: {}-{}",
            self.database.min_connections, self.database.max_connections
        );
        info!("  API:");
        info!("    Listening on: {}:{}", self.api.host, self.api.port);
        info!("  Recommendations:");
        info!("    Top-N: {}", self.recommendation.top_n);
        info!("    History limit: {}", self.recommendation.history_limit);
    }
}

impl DatabaseConfig {
    fn from_env() -> Result<Self> {
        let url = get_env("DATABASE_URL").unwrap_or_else(|_| {
            let user = std::env::var("USER").unwrap_or_else(|_| "postgres".to_string());
            format!("postgres://{}@localhost/tofit_dev", user)
        });

        Ok(Self {
            url,
            max_connections: get_env_or("DB_MAX_CONNECTIONS", "20").parse().unwrap_or(20),
            min_connections: get_env_or("DB_MIN_CONNECTIONS", "5").parse().unwrap_or(5),
            connect_timeout: Duration::from_secs(
                get_env_or("DB_CONNECT_TIMEOUT_SECS", "30")
                    .parse()
                    .unwrap_or(30),
            ),
            idle_timeout: Duration::from_secs(
                get_env_or("DB_IDLE_TIMEOUT_SECS", "600")
                    .parse()
                    .unwrap_or(600),
            ),
            max_lifetime: Duration::from_secs(
                get_env_or("DB_MAX_LIFETIME_SECS", "3600")
                    .parse()
                    .unwrap_or(3600),
            ),
            statement_cache_size: get_env_or("DB_STATEMENT_CACHE_SIZE", "100")
                .parse()
                .unwrap_or(100),
        })
    }
}

impl ApiConfig {
    fn from_env() -> Result<Self> {
        Ok(Self {
            port: get_env_or("API_PORT", "8080").parse().unwrap_or(8080),
            host: get_env_or("API_HOST", "0.0.0.0"),
            request_timeout: Duration::from_secs(
                get_env_or("API_REQUEST_TIMEOUT_SECS", "30")
                    .parse()
                    .unwrap_or(30),
            ),
            cors_enabled: get_env_or("API_CORS_ENABLED", "true")
                .parse()
                .unwrap_or(true),
            cors_origins: get_env_or("API_CORS_ORIGINS", "*")
                .split(',')
                .map(|s| s.trim().to_string())
                .collect(),
        })
    }
}

impl RecommendationConfig {
    fn from_env() -> Result<Self> {
        Ok(Self {
            top_n: get_env_parsed_or("REC_TOP_N", DEFAULT_TOP_N)?,
            history_limit: get_env_parsed_or("REC_HISTORY_LIMIT", DEFAULT_HISTORY_LIMIT)?,
            slow_threshold: Duration::from_millis(
                get_env_or("REC_SLOW_THRESHOLD_MS", "50")
                    .parse()
                    .unwrap_or(50),
            ),
        })
    }
}

impl LoggingConfig {
    fn from_env() -> Result<Self> {
        Ok(Self {
            format: get_env_or("LOG_FORMAT", "compact").parse()?,
        })
    }
}

// ============================================================================
// Helper functions
// ============================================================================

/// Get required environment variable
fn get_env(key: &'static str) -> Result<String> {
    std::env::var(key).map_err(|_| Error::MissingEnvVar { var: key })
}

/// Get environment variable with default
fn get_env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Parse an optional environment variable, rejecting values that are set but malformed
fn get_env_parsed_or<T: std::str::FromStr>(key: &'static str, default: T) -> Result<T>
where
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(value) => value.trim().parse().map_err(|e: T::Err| Error::InvalidConfig {
            key,
            message: format!("Invalid value '{}': {}", value, e).into(),
        }),
        Err(_) => Ok(default),
    }
}

/// Mask sensitive parts of URL
fn mask_url(url: &str) -> String {
    if let Some(at_pos) = url.find('@') {
        if let Some(colon_pos) = url[..at_pos].rfind(':') {
            // Skip the scheme separator in "postgres://user@host"
            if url[colon_pos..].starts_with("://") {
                return url.to_string();
            }
            let (before, after) = url.split_at(colon_pos + 1);
            let (_, rest) = after.split_at(at_pos - colon_pos - 1);
            return format!("{}****{}", before, rest);
        }
    }
    url.to_string()
}

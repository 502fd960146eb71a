//! Service configuration
//!
//! Defaults, `AGRI_*` environment overrides and startup validation.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::access::{DEFAULT_MAX_ATTEMPTS, DEFAULT_MIN_TRUST_SCORE, DEFAULT_WINDOW, PolicyConfig};
use crate::models::{MAX_TRUST_SCORE, MIN_TRUST_SCORE};

/// Minimum length of the token signing secret
pub const MIN_JWT_SECRET_LEN: usize = 32;

/// Configuration for the marketplace contact service
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketConfig {
    /// Server configuration
    pub server: ServerConfig,
    /// Token and request-size limits
    pub security: SecurityConfig,
    /// Contact disclosure gating
    pub access: AccessConfig,
    /// Database configuration
    pub database: DatabaseConfig,
    /// Logging configuration
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Server host to bind to
    pub host: String,
    /// Server port to bind to
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    /// HS256 secret used to verify bearer tokens (loaded from env)
    pub jwt_secret: String,
    /// Maximum request body size in bytes
    pub max_request_size: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessConfig {
    /// Sliding window for contact requests, in seconds
    pub rate_limit_window_secs: u64,
    /// Contact requests allowed per window
    pub rate_limit_max_attempts: usize,
    /// Trust score a buyer needs before contacts are disclosed
    pub min_trust_score: i32,
    /// Interval between sweeps of idle rate-limit keys, in seconds
    pub cleanup_interval_secs: u64,
}

impl Default for AccessConfig {
    fn default() -> Self {
        Self {
            rate_limit_window_secs: DEFAULT_WINDOW.as_secs(),
            rate_limit_max_attempts: DEFAULT_MAX_ATTEMPTS,
            min_trust_score: DEFAULT_MIN_TRUST_SCORE,
            cleanup_interval_secs: 300,
        }
    }
}

impl AccessConfig {
    pub fn window(&self) -> Duration {
        Duration::from_secs(self.rate_limit_window_secs)
    }

    pub fn to_policy(&self) -> PolicyConfig {
        PolicyConfig {
            min_trust_score: self.min_trust_score,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// PostgreSQL connection string
    pub postgres_url: String,
    /// Enable PostgreSQL (if false, uses in-memory fallback)
    pub postgres_enabled: bool,
    /// Pool size
    pub max_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            postgres_url: "postgresql://localhost:5432/agri_market".to_string(),
            postgres_enabled: false,
            max_connections: 10,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (error, warn, info, debug)
    pub level: String,
    /// Mask client addresses in request logs
    pub sanitize_logs: bool,
    /// Enable request/response logging
    pub log_requests: bool,
}

impl Default for MarketConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 5000,
            },
            security: SecurityConfig {
                jwt_secret: String::new(), // Must be set via environment
                max_request_size: 64 * 1024,
            },
            access: AccessConfig::default(),
            database: DatabaseConfig::default(),
            logging: LoggingConfig {
                level: "info".to_string(),
                sanitize_logs: true,
                log_requests: true,
            },
        }
    }
}

/// Parse `name` into `target` when the variable is set
fn env_parse<T>(name: &str, target: &mut T) -> Result<()>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    if let Ok(raw) = env::var(name) {
        *target = raw
            .trim()
            .parse()
            .with_context(|| format!("Invalid {} value", name))?;
    }
    Ok(())
}

impl MarketConfig {
    /// Load configuration from `AGRI_*` environment variables and validate it
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        // Server configuration
        if let Ok(host) = env::var("AGRI_HOST") {
            config.server.host = host;
        }
        env_parse("AGRI_PORT", &mut config.server.port)?;

        // Security configuration
        config.security.jwt_secret = env::var("AGRI_JWT_SECRET")
            .context("AGRI_JWT_SECRET environment variable is required")?;
        env_parse("AGRI_MAX_REQUEST_SIZE", &mut config.security.max_request_size)?;

        // Disclosure gating
        env_parse(
            "AGRI_RATE_LIMIT_WINDOW_SECS",
            &mut config.access.rate_limit_window_secs,
        )?;
        env_parse(
            "AGRI_RATE_LIMIT_MAX_ATTEMPTS",
            &mut config.access.rate_limit_max_attempts,
        )?;
        env_parse("AGRI_MIN_REPUTATION", &mut config.access.min_trust_score)?;
        env_parse(
            "AGRI_RATE_LIMIT_CLEANUP_SECS",
            &mut config.access.cleanup_interval_secs,
        )?;

        // Database configuration
        if let Ok(url) = env::var("AGRI_POSTGRES_URL") {
            config.database.postgres_url = url;
        }
        env_parse("AGRI_POSTGRES_ENABLED", &mut config.database.postgres_enabled)?;
        env_parse(
            "AGRI_POSTGRES_MAX_CONNECTIONS",
            &mut config.database.max_connections,
        )?;

        // Logging configuration
        if let Ok(level) = env::var("AGRI_LOG_LEVEL") {
            config.logging.level = level;
        }
        env_parse("AGRI_SANITIZE_LOGS", &mut config.logging.sanitize_logs)?;
        env_parse("AGRI_LOG_REQUESTS", &mut config.logging.log_requests)?;

        config.validate()?;

        Ok(config)
    }

    /// Validate configuration for security and consistency
    pub fn validate(&self) -> Result<()> {
        if self.server.host.is_empty() {
            return Err(anyhow::anyhow!("Server host cannot be empty"));
        }

        if self.server.port == 0 {
            return Err(anyhow::anyhow!("Server port must be non-zero"));
        }

        if self.security.jwt_secret.len() < MIN_JWT_SECRET_LEN {
            return Err(anyhow::anyhow!(
                "JWT secret is too short (minimum {} characters)",
                MIN_JWT_SECRET_LEN
            ));
        }

        if self.security.max_request_size == 0 {
            return Err(anyhow::anyhow!("Maximum request size must be non-zero"));
        }

        if self.access.rate_limit_max_attempts == 0 {
            return Err(anyhow::anyhow!(
                "Rate limit must allow at least one attempt per window"
            ));
        }

        if self.access.rate_limit_window_secs == 0 {
            return Err(anyhow::anyhow!("Rate limit window must be non-zero"));
        }

        if self.access.cleanup_interval_secs == 0 {
            return Err(anyhow::anyhow!("Rate limit cleanup interval must be non-zero"));
        }

        if !(MIN_TRUST_SCORE..=MAX_TRUST_SCORE).contains(&self.access.min_trust_score) {
            return Err(anyhow::anyhow!(
                "Minimum reputation must be between {} and {}",
                MIN_TRUST_SCORE,
                MAX_TRUST_SCORE
            ));
        }

        if self.database.postgres_enabled && self.database.postgres_url.is_empty() {
            return Err(anyhow::anyhow!(
                "PostgreSQL is enabled but no connection string is configured"
            ));
        }

        Ok(())
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

/// Sanitize sensitive data for logging
pub fn sanitize_for_logging(data: &str) -> String {
    // Connection strings carry credentials between "://" and "@"
    if let (Some(scheme), Some(at)) = (data.find("://"), data.rfind('@')) {
        if scheme + 3 < at {
            return format!("{}***{}", &data[..scheme + 3], &data[at..]);
        }
    }

    let sensitive_patterns = ["token", "password", "secret", "credential", "key"];

    let data_lower = data.to_lowercase();
    for pattern in &sensitive_patterns {
        if data_lower.contains(pattern) {
            if data.len() > 20 {
                return format!("{}***{}", &data[..6], &data[data.len().saturating_sub(6)..]);
            } else {
                return format!(
                    "{}***{}",
                    &data[..data.len().min(2)],
                    &data[data.len().saturating_sub(2)..]
                );
            }
        }
    }

    data.to_string()
}

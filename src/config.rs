//! Environment-driven configuration
//!
//! All settings come from `SAWAARI_*` variables with safe defaults.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;

use crate::reputation::VerificationPolicy;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub security: SecurityConfig,
    pub database: DatabaseConfig,
    pub logging: LoggingConfig,
    pub verification: VerificationConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to
    pub host: String,
    /// Port to bind to
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    /// General rate limit per minute per IP
    pub rate_limit_per_minute: u32,
    /// Stricter limit for write endpoints (create/vote/tip/edit), per hour per IP
    pub write_limit_per_hour: u32,
    /// Maximum request body size in bytes
    pub max_request_size: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// PostgreSQL connection string
    pub postgres_url: String,
    /// Enable PostgreSQL (if false, uses the in-memory store)
    pub postgres_enabled: bool,
    /// Insert sample routes into an empty store on startup
    pub seed_data: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (error, warn, info, debug, trace)
    pub level: String,
    /// Enable per-request tracing spans
    pub log_requests: bool,
}

/// Verification state-machine knobs (see `reputation::VerificationPolicy`)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerificationConfig {
    /// Upvotes required for the pending → verified transition
    pub verify_threshold: u64,
}

impl VerificationConfig {
    pub fn to_policy(&self) -> VerificationPolicy {
        VerificationPolicy {
            verify_threshold: self.verify_threshold,
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 5000,
            },
            security: SecurityConfig {
                rate_limit_per_minute: 100,
                write_limit_per_hour: 60,
                max_request_size: 256 * 1024,
            },
            database: DatabaseConfig {
                postgres_url: "postgresql://localhost:5432/sawaari".to_string(),
                postgres_enabled: false,
                seed_data: false,
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                log_requests: false,
            },
            verification: VerificationConfig {
                verify_threshold: VerificationPolicy::default().verify_threshold,
            },
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Ok(host) = env::var("SAWAARI_HOST") {
            config.server.host = host;
        }

        if let Ok(port) = env::var("SAWAARI_PORT") {
            config.server.port = port.parse().context("Invalid SAWAARI_PORT value")?;
        }

        if let Ok(rate_limit) = env::var("SAWAARI_RATE_LIMIT_PER_MINUTE") {
            config.security.rate_limit_per_minute = rate_limit
                .parse()
                .context("Invalid SAWAARI_RATE_LIMIT_PER_MINUTE value")?;
        }

        if let Ok(write_limit) = env::var("SAWAARI_WRITE_LIMIT_PER_HOUR") {
            config.security.write_limit_per_hour = write_limit
                .parse()
                .context("Invalid SAWAARI_WRITE_LIMIT_PER_HOUR value")?;
        }

        if let Ok(max_size) = env::var("SAWAARI_MAX_REQUEST_SIZE") {
            config.security.max_request_size = max_size
                .parse()
                .context("Invalid SAWAARI_MAX_REQUEST_SIZE value")?;
        }

        if let Ok(url) = env::var("SAWAARI_POSTGRES_URL") {
            config.database.postgres_url = url;
        }

        if let Ok(enabled) = env::var("SAWAARI_POSTGRES_ENABLED") {
            config.database.postgres_enabled = enabled
                .parse()
                .context("Invalid SAWAARI_POSTGRES_ENABLED value")?;
        }

        if let Ok(seed) = env::var("SAWAARI_SEED_DATA") {
            config.database.seed_data =
                seed.parse().context("Invalid SAWAARI_SEED_DATA value")?;
        }

        if let Ok(level) = env::var("SAWAARI_LOG_LEVEL") {
            config.logging.level = level;
        }

        if let Ok(log_requests) = env::var("SAWAARI_LOG_REQUESTS") {
            config.logging.log_requests = log_requests
                .parse()
                .context("Invalid SAWAARI_LOG_REQUESTS value")?;
        }

        if let Ok(threshold) = env::var("SAWAARI_VERIFY_THRESHOLD") {
            let threshold: u64 = threshold
                .parse()
                .context("Invalid SAWAARI_VERIFY_THRESHOLD value")?;
            if threshold == 0 {
                return Err(anyhow::anyhow!(
                    "SAWAARI_VERIFY_THRESHOLD must be at least 1"
                ));
            }
            config.verification.verify_threshold = threshold;
        }

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_preserve_the_shipped_threshold() {
        let config = AppConfig::default();
        assert_eq!(config.verification.verify_threshold, 10);
        assert_eq!(config.verification.to_policy(), VerificationPolicy::default());
    }

    #[test]
    fn defaults_disable_postgres() {
        let config = AppConfig::default();
        assert!(!config.database.postgres_enabled);
    }
}

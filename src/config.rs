//! Configuration management
//!
//! Loads configuration from:
//! 1. Default values
//! 2. Configuration files (config/default.toml, config/local.toml)
//! 3. Environment variables (override)

use serde::Deserialize;
use std::path::PathBuf;

/// Main application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub cache: CacheConfig,
    pub moderation: ModerationConfig,
    pub admin: AdminConfig,
    pub logging: LoggingConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Bind address (e.g., "0.0.0.0")
    pub host: String,
    /// Port number (e.g., 5000)
    pub port: u16,
}

/// Database configuration (SQLite only)
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Path to SQLite database file
    pub path: PathBuf,
}

/// Account cache configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
    /// Maximum number of accounts held in memory
    pub account_capacity: u64,
    /// Time-to-live of a cached account in seconds
    pub account_ttl_seconds: u64,
}

/// Moderation rules
#[derive(Debug, Clone, Deserialize)]
pub struct ModerationConfig {
    /// Reserved username with privileges above ordinary admins.
    /// Compared case-insensitively.
    pub super_admin_username: String,
    /// Followers needed before a verification request is accepted
    pub verification_follower_threshold: u64,
    /// Upper bound of synthetic followers granted per request
    pub follower_grant_batch_limit: u64,
}

/// Bootstrap of the reserved super-admin account
#[derive(Debug, Clone, Deserialize)]
pub struct AdminConfig {
    /// Initial password. The account is only created when this is set.
    pub password: Option<String>,
    /// Display name used when the account is created
    #[serde(default = "default_admin_display_name")]
    pub display_name: String,
}

fn default_admin_display_name() -> String {
    "Admin".to_string()
}

/// Logging configuration
///
/// `RUST_LOG`, when set, overrides `level`.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error
    pub level: String,
    /// Log format: "pretty" or "json"
    pub format: String,
}

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

impl LoggingConfig {
    /// `EnvFilter` directives for the crate and the HTTP trace layer
    pub fn filter_directives(&self) -> String {
        format!("xvo={0},tower_http={0}", self.level.to_ascii_lowercase())
    }

    pub fn is_json(&self) -> bool {
        self.format.eq_ignore_ascii_case("json")
    }
}

impl AppConfig {
    /// Load configuration from file and environment
    ///
    /// # Loading Order
    /// 1. Default values
    /// 2. config/default.toml (if exists)
    /// 3. config/local.toml (if exists)
    /// 4. Environment variables (XVO__*)
    ///
    /// # Errors
    /// Returns error if configuration is invalid
    pub fn load() -> Result<Self, crate::error::AppError> {
        use config::{Config, Environment, File};

        let config = Config::builder()
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 5000)?
            .set_default("database.path", "data/xvo.db")?
            .set_default("cache.account_capacity", 10_000)?
            .set_default("cache.account_ttl_seconds", 3600)?
            .set_default("moderation.super_admin_username", "alz")?
            .set_default("moderation.verification_follower_threshold", 50_000)?
            .set_default("moderation.follower_grant_batch_limit", 5000)?
            .set_default("admin.display_name", "Admin")?
            .set_default("logging.level", "info")?
            .set_default("logging.format", "pretty")?
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            .add_source(
                Environment::with_prefix("XVO")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| crate::error::AppError::Config(e.to_string()))?;

        let app_config: Self = config
            .try_deserialize()
            .map_err(|e| crate::error::AppError::Config(e.to_string()))?;
        app_config.validate()?;
        Ok(app_config)
    }

    fn validate(&self) -> Result<(), crate::error::AppError> {
        if self.moderation.super_admin_username.trim().is_empty() {
            return Err(crate::error::AppError::Config(
                "moderation.super_admin_username must not be empty".to_string(),
            ));
        }

        if self.moderation.verification_follower_threshold == 0 {
            return Err(crate::error::AppError::Config(
                "moderation.verification_follower_threshold must be greater than 0".to_string(),
            ));
        }

        if self.moderation.follower_grant_batch_limit == 0 {
            return Err(crate::error::AppError::Config(
                "moderation.follower_grant_batch_limit must be greater than 0".to_string(),
            ));
        }

        if self.cache.account_capacity == 0 {
            return Err(crate::error::AppError::Config(
                "cache.account_capacity must be greater than 0".to_string(),
            ));
        }

        if !LOG_LEVELS.contains(&self.logging.level.to_ascii_lowercase().as_str()) {
            return Err(crate::error::AppError::Config(format!(
                "logging.level must be one of {}",
                LOG_LEVELS.join(", ")
            )));
        }

        if !matches!(self.logging.format.to_ascii_lowercase().as_str(), "pretty" | "json") {
            return Err(crate::error::AppError::Config(
                "logging.format must be \"pretty\" or \"json\"".to_string(),
            ));
        }

        if matches!(&self.admin.password, Some(password) if password.is_empty()) {
            return Err(crate::error::AppError::Config(
                "admin.password must not be empty when set".to_string(),
            ));
        }

        Ok(())
    }
}

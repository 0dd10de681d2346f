//! Configuration management
//!
//! Loads configuration from:
//! 1. Default values
//! 2. Configuration file (config/default.toml, config/local.toml)
//! 3. Environment variables (override)

use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64_STANDARD};
use serde::Deserialize;
use std::fmt;
use std::path::PathBuf;

/// Base64 AES-256 key used when `app.encryption.key` is not configured.
///
/// Only acceptable for local development; production deployments must
/// override it.
pub const DEVELOPMENT_ENCRYPTION_KEY: &str = "Y29wbGEtZGV2ZWxvcG1lbnQta2V5LWRvLW5vdC11c2U=";

/// Length of the AES-256 session key in bytes
pub const ENCRYPTION_KEY_BYTES: usize = 32;

/// Main application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub app: ApplicationConfig,
    pub bluesky: BlueskyConfig,
    pub logging: LoggingConfig,
}

/// Database configuration (SQLite only)
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Path to SQLite database file
    pub path: PathBuf,
}

/// Deployment environment
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Production,
}

/// `app.*` settings
#[derive(Debug, Clone, Deserialize)]
pub struct ApplicationConfig {
    #[serde(default)]
    pub environment: Environment,
    pub encryption: EncryptionConfig,
}

/// Session credential encryption settings
#[derive(Clone, Deserialize)]
pub struct EncryptionConfig {
    /// Base64-encoded 32-byte AES-256-GCM key
    pub key: String,
    /// Largest session payload accepted for storage, in bytes
    #[serde(default = "default_max_session_bytes")]
    pub max_session_bytes: usize,
}

impl EncryptionConfig {
    /// Decode the configured key
    pub fn key_bytes(&self) -> Result<Vec<u8>, crate::error::AppError> {
        let key = BASE64_STANDARD.decode(self.key.trim()).map_err(|_| {
            crate::error::AppError::Config(
                "app.encryption.key must be valid base64-encoded bytes".to_string(),
            )
        })?;
        if key.len() != ENCRYPTION_KEY_BYTES {
            return Err(crate::error::AppError::Config(format!(
                "app.encryption.key must decode to {} bytes",
                ENCRYPTION_KEY_BYTES
            )));
        }
        Ok(key)
    }

    pub fn uses_development_key(&self) -> bool {
        self.key.trim() == DEVELOPMENT_ENCRYPTION_KEY
    }
}

// The key must never reach logs, so Debug is written by hand.
impl fmt::Debug for EncryptionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EncryptionConfig")
            .field("key", &"<redacted>")
            .field("max_session_bytes", &self.max_session_bytes)
            .finish()
    }
}

fn default_max_session_bytes() -> usize {
    16 * 1024
}

/// Bluesky settings
#[derive(Debug, Clone, Deserialize)]
pub struct BlueskyConfig {
    /// Prefix for public profile URLs; the handle is appended verbatim
    #[serde(default = "default_profile_base_url")]
    pub profile_base_url: String,
}

impl BlueskyConfig {
    /// Public profile URL for a handle
    pub fn profile_url(&self, handle: &str) -> String {
        format!("{}{}", self.profile_base_url, handle)
    }
}

impl Default for BlueskyConfig {
    fn default() -> Self {
        Self {
            profile_base_url: default_profile_base_url(),
        }
    }
}

fn default_profile_base_url() -> String {
    "https://bsky.app/profile/".to_string()
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error
    pub level: String,
    /// Log format: "pretty" or "json"
    pub format: String,
}

impl AppConfig {
    /// Load configuration from file and environment
    ///
    /// # Loading Order
    /// 1. Default values
    /// 2. config/default.toml (if exists)
    /// 3. config/local.toml (if exists)
    /// 4. Environment variables (COPLA__*)
    ///
    /// # Errors
    /// Returns error if configuration is invalid
    pub fn load() -> Result<Self, crate::error::AppError> {
        use config::{Config, Environment, File};

        let config = Config::builder()
            .set_default("database.path", "data/copla.db")?
            .set_default("app.environment", "development")?
            .set_default("app.encryption.key", DEVELOPMENT_ENCRYPTION_KEY)?
            .set_default("app.encryption.max_session_bytes", 16 * 1024)?
            .set_default("bluesky.profile_base_url", default_profile_base_url())?
            .set_default("logging.level", "info")?
            .set_default("logging.format", "pretty")?
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            .add_source(
                Environment::with_prefix("COPLA")
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
        self.app.encryption.key_bytes()?;

        if self.app.encryption.uses_development_key()
            && self.app.environment == Environment::Production
        {
            return Err(crate::error::AppError::Config(
                "app.encryption.key must be overridden when app.environment=production"
                    .to_string(),
            ));
        }

        if self.app.encryption.max_session_bytes == 0 {
            return Err(crate::error::AppError::Config(
                "app.encryption.max_session_bytes must be greater than 0".to_string(),
            ));
        }

        let base = url::Url::parse(&self.bluesky.profile_base_url).map_err(|e| {
            crate::error::AppError::Config(format!(
                "bluesky.profile_base_url is not a valid URL: {e}"
            ))
        })?;
        if !matches!(base.scheme(), "http" | "https") {
            return Err(crate::error::AppError::Config(
                "bluesky.profile_base_url must use http or https".to_string(),
            ));
        }

        Ok(())
    }
}

//! Configuration management for modelvault
//!
//! Defaults, TOML files and `MODELVAULT_<SECTION>_<KEY>` environment
//! overrides. Passwords never live in the configuration itself; the crypto
//! section only names the environment variable that holds one.

use crate::codec::ArchiveFormat;
use crate::crypto::SchemeVersion;
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;
use zeroize::Zeroizing;

mod error;

pub use error::ConfigError;

/// Main application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    pub store: StoreConfig,

    pub crypto: CryptoConfig,

    pub logging: LoggingConfig,
}

/// Where and how models are saved
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Directory holding one file per saved model
    pub data_dir: PathBuf,

    /// Save format (json, binary)
    pub format: ArchiveFormat,

    /// Load archives containing classes this build no longer knows,
    /// dropping those objects
    pub skip_unknown_classes: bool,
}

/// Encryption at rest
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CryptoConfig {
    pub enabled: bool,

    /// Scheme used for new saves; older archives open regardless
    pub scheme_version: SchemeVersion,

    /// Name of the environment variable holding the password
    pub password_env: String,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Enable JSON formatting
    pub json_format: bool,

    /// Include timestamps
    pub with_timestamp: bool,

    /// Include target module
    pub with_target: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./data"),
            format: ArchiveFormat::Json,
            skip_unknown_classes: false,
        }
    }
}

impl Default for CryptoConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            scheme_version: SchemeVersion::CURRENT,
            password_env: "MODELVAULT_PASSWORD".to_string(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json_format: false,
            with_timestamp: true,
            with_target: true,
        }
    }
}

fn parse_flag(name: &str, value: &str) -> Result<bool, ConfigError> {
    value
        .parse()
        .map_err(|e| ConfigError::InvalidValue(format!("Invalid {} flag: {}", name, e)))
}

impl Config {
    /// Load configuration from environment variables
    ///
    /// Environment variables follow the pattern: MODELVAULT_<SECTION>_<KEY>
    /// Example: MODELVAULT_STORE_FORMAT=binary
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();

        // Store config
        if let Ok(data_dir) = env::var("MODELVAULT_STORE_DATA_DIR") {
            config.store.data_dir = PathBuf::from(data_dir);
        }
        if let Ok(format) = env::var("MODELVAULT_STORE_FORMAT") {
            config.store.format = format
                .parse()
                .map_err(|e| ConfigError::InvalidValue(format!("Invalid store format: {}", e)))?;
        }
        if let Ok(skip) = env::var("MODELVAULT_STORE_SKIP_UNKNOWN_CLASSES") {
            config.store.skip_unknown_classes = parse_flag("skip-unknown-classes", &skip)?;
        }

        // Crypto config
        if let Ok(enabled) = env::var("MODELVAULT_CRYPTO_ENABLED") {
            config.crypto.enabled = parse_flag("encryption", &enabled)?;
        }
        if let Ok(version) = env::var("MODELVAULT_CRYPTO_SCHEME_VERSION") {
            let version: f64 = version
                .parse()
                .map_err(|e| ConfigError::InvalidValue(format!("Invalid scheme version: {}", e)))?;
            config.crypto.scheme_version = SchemeVersion::from_f64(version)
                .map_err(|e| ConfigError::InvalidValue(e.to_string()))?;
        }
        if let Ok(password_env) = env::var("MODELVAULT_CRYPTO_PASSWORD_ENV") {
            config.crypto.password_env = password_env;
        }

        // Logging config
        if let Ok(level) = env::var("MODELVAULT_LOG_LEVEL") {
            config.logging.level = level;
        }
        if let Ok(json) = env::var("MODELVAULT_LOG_JSON") {
            config.logging.json_format = parse_flag("JSON", &json)?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from file
    pub fn from_file(path: impl AsRef<std::path::Path>) -> Result<Self, ConfigError> {
        let contents =
            std::fs::read_to_string(path).map_err(|e| ConfigError::FileReadError(e.to_string()))?;

        let config: Self =
            toml::from_str(&contents).map_err(|e| ConfigError::ParseError(e.to_string()))?;

        config.validate()?;
        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.store.data_dir.as_os_str().is_empty() {
            return Err(ConfigError::ValidationFailed(
                "data_dir must not be empty".to_string(),
            ));
        }

        if self.crypto.enabled && self.crypto.password_env.trim().is_empty() {
            return Err(ConfigError::ValidationFailed(
                "encryption enabled but password_env not provided".to_string(),
            ));
        }

        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.as_str()) {
            return Err(ConfigError::ValidationFailed(format!(
                "Invalid log level: {}",
                self.logging.level
            )));
        }

        Ok(())
    }

    /// Save configuration to file
    pub fn save_to_file(&self, path: impl AsRef<std::path::Path>) -> Result<(), ConfigError> {
        let contents =
            toml::to_string_pretty(self).map_err(|e| ConfigError::SerializeError(e.to_string()))?;

        std::fs::write(path, contents).map_err(|e| ConfigError::FileWriteError(e.to_string()))?;

        Ok(())
    }

    /// Password for sealing saved models, `None` when encryption is off
    pub fn resolve_password(&self) -> Result<Option<Zeroizing<String>>, ConfigError> {
        if !self.crypto.enabled {
            return Ok(None);
        }
        env::var(&self.crypto.password_env)
            .map(|password| Some(Zeroizing::new(password)))
            .map_err(|_| ConfigError::MissingPassword(self.crypto.password_env.clone()))
    }
}

//! services/app/src/config.rs
//!
//! Defines the application's configuration structure and loading logic.
//!
//! All configuration is loaded from environment variables at startup. The `.env`
//! file is used for local development.

use std::path::PathBuf;
use tracing::Level;

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing the environment variable {0}")]
    MissingVar(String),
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    /// Base URL of the managed identity platform.
    pub identity_url: String,
    /// Base URL of the profile document store.
    pub profile_store_url: String,
    /// Project API key, passed to both services as a query parameter.
    pub api_key: String,
    /// Where the signed-in session is persisted between runs.
    pub session_file: PathBuf,
    pub log_level: Level,
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// It will look for a `.env` file in the current directory for development,
    /// but this is skipped in test environments to ensure tests are hermetic.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Only load from .env in non-test mode to avoid contamination.
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }

        let identity_url = std::env::var("IDENTITY_URL")
            .map_err(|_| ConfigError::MissingVar("IDENTITY_URL".to_string()))?;

        let profile_store_url = std::env::var("PROFILE_STORE_URL")
            .map_err(|_| ConfigError::MissingVar("PROFILE_STORE_URL".to_string()))?;

        let api_key =
            std::env::var("API_KEY").map_err(|_| ConfigError::MissingVar("API_KEY".to_string()))?;

        let session_file = std::env::var("SESSION_FILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("./.papershelf-session.json"));

        let log_level_str = std::env::var("RUST_LOG").unwrap_or_else(|_| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        Ok(Self {
            identity_url,
            profile_store_url,
            api_key,
            session_file,
            log_level,
        })
    }
}

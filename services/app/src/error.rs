//! services/app/src/error.rs
//!
//! Defines the primary error type for the entire app service.

use crate::config::ConfigError;
use papershelf_core::session::AuthFailure;
use papershelf_core::validation::ValidationError;

/// The primary error type for the `app` service.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Represents an error that occurred during configuration loading.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// A classified failure surfaced by the Session Manager.
    #[error("{0}")]
    Auth(#[from] AuthFailure),

    /// A caller-side input rejection, raised before any remote call.
    #[error("{0}")]
    Validation(#[from] ValidationError),

    /// Represents an error from the underlying HTTP client.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Represents a standard Input/Output error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A catch-all for any other unexpected errors.
    #[error("An unexpected internal error occurred: {0}")]
    Internal(String),
}

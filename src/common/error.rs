//! Error types for the conformance runner
//!
//! These are process-level errors. Everything that goes wrong inside a check
//! body is captured as an [`Outcome`](crate::testing::Outcome) instead and
//! never reaches this type.

use std::io;
use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the conformance runner
#[derive(Error, Debug)]
pub enum Error {
    // === Registration Errors ===
    #[error("Test '{name}' is already registered (category '{category}')")]
    DuplicateTest { name: String, category: String },

    // === Configuration Errors ===
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid configuration file: {0}")]
    ConfigParse(String),

    #[error("Invalid server URL '{url}': {reason}")]
    InvalidServerUrl { url: String, reason: String },

    #[error("Unknown provider '{name}'. Supported: {supported}")]
    UnknownProvider { name: String, supported: String },

    #[error("Failed to set up client: {0}")]
    Client(#[from] crate::client::ClientError),

    // === IO Errors ===
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Failed to read file '{path}': {error}")]
    FileRead { path: String, error: String },

    // === Serialization Errors ===
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Create a duplicate registration error
    pub fn duplicate_test(name: &str, category: &str) -> Self {
        Self::DuplicateTest {
            name: name.to_string(),
            category: category.to_string(),
        }
    }

    /// Create an invalid server URL error
    pub fn invalid_server_url(url: &str, reason: impl ToString) -> Self {
        Self::InvalidServerUrl {
            url: url.to_string(),
            reason: reason.to_string(),
        }
    }

    /// Create an unknown provider error listing the supported ids
    pub fn unknown_provider<S: AsRef<str>>(name: &str, supported: &[S]) -> Self {
        Self::UnknownProvider {
            name: name.to_string(),
            supported: supported
                .iter()
                .map(|s| s.as_ref())
                .collect::<Vec<_>>()
                .join(", "),
        }
    }
}

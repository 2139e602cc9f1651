//! Configuration file handling
//!
//! Settings come from three layers: command-line flags, an optional TOML
//! file, and built-in defaults. [`Settings::resolve`] merges them and
//! validates the result before any test runs.

use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

use super::paths::config_path;
use super::{Error, Result};
use crate::suite::provider::{self, ProviderProfile};

/// Main configuration structure
#[derive(Debug, Deserialize, Default)]
pub struct Config {
    /// System under test
    #[serde(default)]
    pub server: ServerConfig,

    /// Check catalog settings
    #[serde(default)]
    pub suite: SuiteConfig,

    /// Report rendering settings
    #[serde(default)]
    pub report: ReportConfig,
}

/// Server settings
#[derive(Debug, Deserialize)]
pub struct ServerConfig {
    /// Base URL of the server under test
    #[serde(default = "default_url")]
    pub url: String,

    /// Per-test budget in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            url: default_url(),
            timeout_secs: default_timeout(),
        }
    }
}

fn default_url() -> String {
    "http://127.0.0.1:8080".to_string()
}

fn default_timeout() -> u64 {
    30
}

/// Check catalog settings
#[derive(Debug, Deserialize)]
pub struct SuiteConfig {
    /// Provider profile id (e.g. "chatgpt", "copilot")
    #[serde(default = "default_provider")]
    pub provider: String,

    /// Model override; the provider's default model is used when unset
    #[serde(default)]
    pub model: Option<String>,
}

impl Default for SuiteConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            model: None,
        }
    }
}

fn default_provider() -> String {
    "chatgpt".to_string()
}

/// Report rendering settings
#[derive(Debug, Deserialize)]
pub struct ReportConfig {
    /// Maximum characters of an actual value shown in the console tree
    #[serde(default = "default_max_got_len")]
    pub max_got_len: usize,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            max_got_len: default_max_got_len(),
        }
    }
}

fn default_max_got_len() -> usize {
    100
}

impl Config {
    /// Load configuration
    ///
    /// An explicit path must exist. Without one, the default config file is
    /// read if present and built-in defaults are used otherwise.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::from_file(path);
        }

        if let Some(path) = config_path() {
            if path.exists() {
                return Self::from_file(&path);
            }
        }
        Ok(Self::default())
    }

    fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| Error::FileRead {
            path: path.display().to_string(),
            error: e.to_string(),
        })?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::ConfigParse(e.to_string()))
    }
}

/// Values given on the command line; `None` defers to the config file
#[derive(Debug, Default, Clone)]
pub struct Overrides {
    pub server: Option<String>,
    pub timeout_secs: Option<u64>,
    pub provider: Option<String>,
    pub model: Option<String>,
    pub verbose: bool,
}

/// Validated settings for one invocation
#[derive(Debug, Clone)]
pub struct Settings {
    /// Base URL without trailing slash
    pub server: String,
    /// Per-test budget
    pub timeout: Duration,
    pub provider: &'static ProviderProfile,
    pub model: String,
    pub verbose: bool,
    pub max_got_len: usize,
}

impl Settings {
    /// Merge command-line overrides over the config file and validate
    pub fn resolve(config: &Config, overrides: Overrides) -> Result<Self> {
        let server = overrides
            .server
            .unwrap_or_else(|| config.server.url.clone());
        let server = validate_server_url(&server)?;

        let timeout_secs = overrides.timeout_secs.unwrap_or(config.server.timeout_secs);
        if timeout_secs == 0 {
            return Err(Error::Config(
                "Timeout must be at least 1 second".to_string(),
            ));
        }

        let provider_id = overrides
            .provider
            .unwrap_or_else(|| config.suite.provider.clone());
        let provider = provider::get_provider(&provider_id).ok_or_else(|| {
            let ids: Vec<&str> = provider::all_providers().iter().map(|p| p.id).collect();
            Error::unknown_provider(&provider_id, &ids)
        })?;

        let model = overrides
            .model
            .or_else(|| config.suite.model.clone())
            .unwrap_or_else(|| provider.default_model.to_string());

        Ok(Self {
            server,
            timeout: Duration::from_secs(timeout_secs),
            provider,
            model,
            verbose: overrides.verbose,
            max_got_len: config.report.max_got_len,
        })
    }
}

fn validate_server_url(raw: &str) -> Result<String> {
    let trimmed = raw.trim_end_matches('/');
    let url = reqwest::Url::parse(trimmed).map_err(|e| Error::invalid_server_url(raw, e))?;
    match url.scheme() {
        "http" | "https" => Ok(trimmed.to_string()),
        other => Err(Error::invalid_server_url(
            raw,
            format!("unsupported scheme '{}'", other),
        )),
    }
}

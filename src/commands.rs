//! CLI argument definitions
//!
//! Defines the clap arguments for the conformance runner.

use clap::Parser;
use std::path::PathBuf;

use crate::common::config::Overrides;

#[derive(Parser, Debug)]
#[command(
    name = "compat-check",
    about = "Conformance checks for an OpenAI-compatible chat completions server"
)]
#[command(version, long_about = None)]
pub struct Args {
    /// Categories to run (default: all)
    pub categories: Vec<String>,

    /// Run a single test by name (overrides categories)
    #[arg(long = "test", value_name = "NAME")]
    pub test: Option<String>,

    /// List available tests and exit
    #[arg(long)]
    pub list: bool,

    /// Output results as JSON
    #[arg(long)]
    pub json: bool,

    /// Server base URL [default: http://127.0.0.1:8080]
    #[arg(long, value_name = "URL")]
    pub server: Option<String>,

    /// Per-test timeout in seconds [default: 30]
    #[arg(long, value_name = "SECS", value_parser = clap::value_parser!(u64).range(1..))]
    pub timeout: Option<u64>,

    /// Verbose logging on stderr
    #[arg(long, short)]
    pub verbose: bool,

    /// Provider behind the server: chatgpt or copilot [default: chatgpt]
    #[arg(long, short)]
    pub provider: Option<String>,

    /// Model to test (default: the provider's default model)
    #[arg(long, short)]
    pub model: Option<String>,

    /// Configuration file (default: the user config directory)
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,
}

impl Args {
    /// Command-line values that take precedence over the config file
    pub fn overrides(&self) -> Overrides {
        Overrides {
            server: self.server.clone(),
            timeout_secs: self.timeout,
            provider: self.provider.clone(),
            model: self.model.clone(),
            verbose: self.verbose,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_defer_to_config() {
        let args = Args::parse_from(["compat-check"]);
        assert!(args.categories.is_empty());
        assert!(!args.list && !args.json && !args.verbose);
        let overrides = args.overrides();
        assert!(overrides.server.is_none());
        assert!(overrides.timeout_secs.is_none());
    }

    #[test]
    fn test_full_command_line() {
        let args = Args::parse_from([
            "compat-check",
            "tools",
            "errors",
            "--json",
            "--server",
            "http://localhost:9000",
            "--timeout",
            "5",
            "-p",
            "copilot",
            "-m",
            "copilot/gpt-4.1",
            "-v",
        ]);
        assert_eq!(args.categories, vec!["tools", "errors"]);
        assert!(args.json);
        assert!(args.verbose);
        let overrides = args.overrides();
        assert_eq!(overrides.timeout_secs, Some(5));
        assert_eq!(overrides.provider.as_deref(), Some("copilot"));
        assert_eq!(overrides.model.as_deref(), Some("copilot/gpt-4.1"));
    }

    #[test]
    fn test_single_test_flag() {
        let args = Args::parse_from(["compat-check", "--test", "health_endpoint"]);
        assert_eq!(args.test.as_deref(), Some("health_endpoint"));
    }

    #[test]
    fn test_zero_timeout_rejected() {
        assert!(Args::try_parse_from(["compat-check", "--timeout", "0"]).is_err());
    }
}

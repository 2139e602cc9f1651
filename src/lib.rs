//! compat-check - conformance checks for OpenAI-compatible servers
//!
//! The [`testing`] module is a small test orchestration engine: registry,
//! assertions, timeout-bounded execution, selection and reporting. The
//! [`suite`] module is the catalog of checks it runs, written against the
//! clients in [`client`].

pub mod cli;
pub mod client;
pub mod commands;
pub mod common;
pub mod suite;
pub mod testing;

// Re-export commonly used types for tests
pub use common::{Error, Result};
pub use testing::{CheckError, CheckResult, Outcome, Registry, RunReport, Runner, TestResult};

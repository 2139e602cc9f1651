//! Conformance checks for an OpenAI-compatible chat completions server
//!
//! Every check is an `async fn(Arc<Context>) -> CheckResult` registered by
//! [`register_all`]. The engine in [`crate::testing`] knows nothing about
//! what they verify.

mod basic_chat;
mod connectivity;
mod errors;
mod models;
mod parameters;
pub mod provider;
mod response_format;
mod streaming;
mod tools;

use crate::client::{ChatClient, ChatRequest, HttpClient};
use crate::common::config::Settings;
use crate::common::Result;
use crate::testing::{CategoryOrder, Registry};
use provider::ProviderProfile;

/// Display and execution order of the shipped categories
pub const CATEGORY_ORDER: &[&str] = &[
    "connectivity",
    "basic_chat",
    "streaming",
    "models",
    "tools",
    "parameters",
    "errors",
    "response_format",
];

/// Shared state handed to every check
#[derive(Debug)]
pub struct Context {
    pub settings: Settings,
    pub http: HttpClient,
    pub chat: ChatClient,
}

impl Context {
    /// Build the clients for the configured server
    pub fn new(settings: Settings) -> Result<Self> {
        let http = HttpClient::new(&settings.server, settings.timeout)?;
        let chat = ChatClient::new(http.clone());
        Ok(Self {
            settings,
            http,
            chat,
        })
    }

    pub fn provider(&self) -> &'static ProviderProfile {
        self.settings.provider
    }

    pub fn model(&self) -> &str {
        &self.settings.model
    }

    /// A request for the configured model with no messages yet
    pub fn request(&self) -> ChatRequest {
        ChatRequest::new(self.model())
    }
}

/// Register every shipped check
pub fn register_all(registry: &mut Registry<Context>) -> Result<()> {
    connectivity::register(registry)?;
    basic_chat::register(registry)?;
    streaming::register(registry)?;
    models::register(registry)?;
    tools::register(registry)?;
    parameters::register(registry)?;
    errors::register(registry)?;
    response_format::register(registry)?;
    Ok(())
}

/// Priority order for the shipped categories
pub fn category_order() -> CategoryOrder {
    CategoryOrder::new(CATEGORY_ORDER.iter().copied())
}

/// The full catalog
pub fn registry() -> Result<Registry<Context>> {
    let mut registry = Registry::new();
    register_all(&mut registry)?;
    Ok(registry)
}

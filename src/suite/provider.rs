//! Provider profiles
//!
//! Each upstream provider behind the server supports a different slice of
//! the API. Checks consult the selected profile and skip what does not apply.

use std::fmt;

/// Capabilities of one provider
#[derive(Debug, Clone)]
pub struct ProviderProfile {
    /// Identifier, also the model prefix (e.g., "chatgpt")
    pub id: &'static str,
    /// Display name
    pub name: &'static str,
    /// Model used when none is given
    pub default_model: &'static str,
    /// Models that must appear in `/v1/models`
    pub expected_models: &'static [&'static str],
    /// Model names accept `-low`/`-medium`/`-high` suffixes
    pub supports_effort_suffix: bool,
    /// `reasoning_effort` is forwarded upstream
    pub supports_reasoning_headers: bool,
    /// temperature, top_p, max_tokens and friends are honoured, not ignored
    pub supports_sampling_params: bool,
    /// `tool_choice` may name a specific function
    pub supports_named_tool_choice: bool,
}

impl fmt::Display for ProviderProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id)
    }
}

static PROVIDERS: &[ProviderProfile] = &[
    ProviderProfile {
        id: "chatgpt",
        name: "ChatGPT",
        default_model: "chatgpt/gpt-5",
        expected_models: &["chatgpt/gpt-5"],
        supports_effort_suffix: true,
        supports_reasoning_headers: true,
        supports_sampling_params: false,
        supports_named_tool_choice: false,
    },
    ProviderProfile {
        id: "copilot",
        name: "GitHub Copilot",
        default_model: "copilot/gpt-4o",
        expected_models: &["copilot/gpt-4o"],
        supports_effort_suffix: false,
        supports_reasoning_headers: false,
        supports_sampling_params: true,
        supports_named_tool_choice: true,
    },
];

/// Get all known providers
pub fn all_providers() -> &'static [ProviderProfile] {
    PROVIDERS
}

/// Get a provider by ID
pub fn get_provider(id: &str) -> Option<&'static ProviderProfile> {
    PROVIDERS.iter().find(|p| p.id == id)
}

/// Strip the `provider/` prefix from a model name
pub fn bare_model(model: &str) -> &str {
    model.split_once('/').map(|(_, rest)| rest).unwrap_or(model)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_provider() {
        assert_eq!(get_provider("copilot").unwrap().name, "GitHub Copilot");
        assert!(get_provider("bard").is_none());
    }

    #[test]
    fn test_default_models_carry_prefix() {
        for provider in all_providers() {
            assert!(provider.default_model.starts_with(&format!("{}/", provider.id)));
            assert!(provider.expected_models.contains(&provider.default_model));
        }
    }

    #[test]
    fn test_bare_model() {
        assert_eq!(bare_model("chatgpt/gpt-5"), "gpt-5");
        assert_eq!(bare_model("gpt-5"), "gpt-5");
        assert_eq!(bare_model("a/b/c"), "b/c");
    }
}

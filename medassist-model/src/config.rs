//! Provider configuration.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::provider::ProviderKind;
use crate::retry::RetryPolicy;

/// Default Groq model.
pub const GROQ_DEFAULT_MODEL: &str = "llama-3.3-70b-versatile";
/// Default OpenAI model.
pub const OPENAI_DEFAULT_MODEL: &str = "gpt-4o-mini";
/// Default Gemini model.
pub const GEMINI_DEFAULT_MODEL: &str = "gemini-1.5-flash";

/// Groq's OpenAI-compatible API base.
pub const GROQ_API_BASE: &str = "https://api.groq.com/openai/v1";
/// OpenAI API base.
pub const OPENAI_API_BASE: &str = "https://api.openai.com/v1";
/// Gemini REST API base.
pub const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Credential, model, and endpoint for one provider.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// API key; the provider is unavailable when this is `None` or empty.
    #[serde(default, skip_serializing)]
    pub api_key: Option<String>,
    /// Model name sent with each request.
    pub model: String,
    /// API base URL.
    pub base_url: String,
}

impl ProviderConfig {
    /// Create a config without a credential.
    pub fn new(model: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self { api_key: None, model: model.into(), base_url: base_url.into() }
    }

    /// Set the API key.
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// The API key if it is set and non-blank.
    pub fn credential(&self) -> Option<&str> {
        self.api_key.as_deref().map(str::trim).filter(|key| !key.is_empty())
    }
}

impl fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .finish()
    }
}

/// Settings shared by all providers plus one [`ProviderConfig`] per provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Groq settings.
    pub groq: ProviderConfig,
    /// OpenAI settings.
    pub openai: ProviderConfig,
    /// Gemini settings.
    pub gemini: ProviderConfig,
    /// Sampling temperature for every request.
    pub temperature: f32,
    /// Per-request timeout in seconds.
    pub request_timeout_secs: u64,
    /// Retry policy for transient failures.
    pub retry: RetryPolicy,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            groq: ProviderConfig::new(GROQ_DEFAULT_MODEL, GROQ_API_BASE),
            openai: ProviderConfig::new(OPENAI_DEFAULT_MODEL, OPENAI_API_BASE),
            gemini: ProviderConfig::new(GEMINI_DEFAULT_MODEL, GEMINI_API_BASE),
            temperature: 0.7,
            request_timeout_secs: 60,
            retry: RetryPolicy::default(),
        }
    }
}

impl ModelConfig {
    /// Settings for one provider.
    pub fn provider(&self, kind: ProviderKind) -> &ProviderConfig {
        match kind {
            ProviderKind::Groq => &self.groq,
            ProviderKind::OpenAi => &self.openai,
            ProviderKind::Gemini => &self.gemini,
        }
    }

    /// Mutable settings for one provider.
    pub fn provider_mut(&mut self, kind: ProviderKind) -> &mut ProviderConfig {
        match kind {
            ProviderKind::Groq => &mut self.groq,
            ProviderKind::OpenAi => &mut self.openai,
            ProviderKind::Gemini => &mut self.gemini,
        }
    }

    /// Fill each missing credential from its conventional environment
    /// variable (`GROQ_API_KEY`, `OPENAI_API_KEY`, `GOOGLE_API_KEY`).
    pub fn with_env_credentials(mut self) -> Self {
        for kind in ProviderKind::ALL {
            let provider = self.provider_mut(kind);
            if provider.credential().is_none() {
                if let Ok(key) = std::env::var(kind.env_var()) {
                    provider.api_key = Some(key);
                }
            }
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_reference_models() {
        let config = ModelConfig::default();
        assert_eq!(config.groq.model, "llama-3.3-70b-versatile");
        assert_eq!(config.openai.model, "gpt-4o-mini");
        assert_eq!(config.gemini.model, "gemini-1.5-flash");
        assert!((config.temperature - 0.7).abs() < f32::EPSILON);
        assert_eq!(config.request_timeout_secs, 60);
    }

    #[test]
    fn blank_key_is_not_a_credential() {
        let config = ProviderConfig::new("m", "u").with_api_key("   ");
        assert_eq!(config.credential(), None);
    }

    #[test]
    fn debug_redacts_api_key() {
        let config = ProviderConfig::new("m", "u").with_api_key("sk-secret");
        let rendered = format!("{config:?}");
        assert!(!rendered.contains("sk-secret"));
        assert!(rendered.contains("<redacted>"));
    }

    #[test]
    fn api_key_is_never_serialized() {
        let config = ProviderConfig::new("m", "u").with_api_key("sk-secret");
        assert!(!serde_json::to_string(&config).unwrap().contains("sk-secret"));
    }
}

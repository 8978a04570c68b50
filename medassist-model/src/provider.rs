//! The [`ModelProvider`] capability and provider selection.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::config::ModelConfig;
use crate::error::ModelError;
use crate::gemini::GeminiProvider;
use crate::message::Message;
use crate::openai_compat::OpenAiCompatibleProvider;

/// A hosted chat model.
///
/// `invoke` sends the full conversation and returns the reply text.
#[async_trait]
pub trait ModelProvider: Send + Sync {
    /// The model name.
    fn name(&self) -> &str;

    /// Which provider serves this model.
    fn kind(&self) -> ProviderKind;

    /// Send `messages` and return the model's reply.
    async fn invoke(&self, messages: &[Message]) -> Result<String, ModelError>;
}

/// The supported hosted providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// Groq (OpenAI-compatible API).
    Groq,
    /// OpenAI.
    #[serde(rename = "openai")]
    OpenAi,
    /// Google Gemini.
    Gemini,
}

impl ProviderKind {
    /// All providers in preference order.
    pub const ALL: [ProviderKind; 3] =
        [ProviderKind::Groq, ProviderKind::OpenAi, ProviderKind::Gemini];

    /// Display name.
    pub fn label(self) -> &'static str {
        match self {
            ProviderKind::Groq => "Groq",
            ProviderKind::OpenAi => "OpenAI",
            ProviderKind::Gemini => "Gemini",
        }
    }

    /// Environment variable holding the provider's API key.
    pub fn env_var(self) -> &'static str {
        match self {
            ProviderKind::Groq => "GROQ_API_KEY",
            ProviderKind::OpenAi => "OPENAI_API_KEY",
            ProviderKind::Gemini => "GOOGLE_API_KEY",
        }
    }

    pub(crate) fn missing_credential(self) -> ModelError {
        ModelError::MissingCredential {
            provider: self.label().to_string(),
            env_var: self.env_var().to_string(),
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for ProviderKind {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "groq" => Ok(ProviderKind::Groq),
            "openai" | "open-ai" | "gpt" => Ok(ProviderKind::OpenAi),
            "gemini" | "google" => Ok(ProviderKind::Gemini),
            other => Err(ModelError::UnknownProvider(other.to_string())),
        }
    }
}

/// Providers whose credential is configured, in preference order.
pub fn available_providers(config: &ModelConfig) -> Vec<ProviderKind> {
    ProviderKind::ALL
        .into_iter()
        .filter(|kind| config.provider(*kind).credential().is_some())
        .collect()
}

/// Construct the provider for `kind`.
///
/// # Errors
///
/// Returns [`ModelError::MissingCredential`] if that provider has no API key.
/// Other providers are unaffected.
pub fn create_provider(
    kind: ProviderKind,
    config: &ModelConfig,
) -> Result<Arc<dyn ModelProvider>, ModelError> {
    let provider: Arc<dyn ModelProvider> = match kind {
        ProviderKind::Groq | ProviderKind::OpenAi => {
            Arc::new(OpenAiCompatibleProvider::new(kind, config)?)
        }
        ProviderKind::Gemini => Arc::new(GeminiProvider::new(config)?),
    };
    info!(provider = kind.label(), model = provider.name(), "model provider ready");
    Ok(provider)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn available_follows_configured_keys_in_order() {
        let mut config = ModelConfig::default();
        assert!(available_providers(&config).is_empty());

        config.gemini.api_key = Some("g".into());
        config.groq.api_key = Some("q".into());
        assert_eq!(available_providers(&config), vec![ProviderKind::Groq, ProviderKind::Gemini]);
    }

    #[test]
    fn create_fails_only_for_the_unconfigured_provider() {
        let mut config = ModelConfig::default();
        config.openai.api_key = Some("sk-test".into());

        assert!(create_provider(ProviderKind::OpenAi, &config).is_ok());
        assert!(matches!(
            create_provider(ProviderKind::Gemini, &config),
            Err(ModelError::MissingCredential { .. })
        ));
    }

    #[test]
    fn parses_names_case_insensitively() {
        assert_eq!("OpenAI".parse::<ProviderKind>().unwrap(), ProviderKind::OpenAi);
        assert_eq!(" groq ".parse::<ProviderKind>().unwrap(), ProviderKind::Groq);
        assert_eq!("google".parse::<ProviderKind>().unwrap(), ProviderKind::Gemini);
        assert!(matches!("claude".parse::<ProviderKind>(), Err(ModelError::UnknownProvider(_))));
    }

    #[test]
    fn serializes_lowercase() {
        assert_eq!(serde_json::to_string(&ProviderKind::OpenAi).unwrap(), "\"openai\"");
    }
}

//! Chat-completions adapter shared by OpenAI and Groq.
//!
//! Groq exposes an OpenAI-compatible endpoint, so both providers send the
//! same request body to `{base_url}/chat/completions` with a bearer token.

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{Value, json};
use tracing::{debug, instrument};

use crate::config::ModelConfig;
use crate::error::ModelError;
use crate::http::{build_client, send_json};
use crate::message::Message;
use crate::provider::{ModelProvider, ProviderKind};
use crate::retry::RetryPolicy;

/// Provider for any OpenAI-compatible chat-completions API.
pub struct OpenAiCompatibleProvider {
    kind: ProviderKind,
    client: Client,
    api_key: String,
    model: String,
    endpoint: String,
    temperature: f32,
    retry: RetryPolicy,
}

impl OpenAiCompatibleProvider {
    /// Create a provider for `kind` from its settings in `config`.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::MissingCredential`] if the provider has no key.
    pub fn new(kind: ProviderKind, config: &ModelConfig) -> Result<Self, ModelError> {
        let settings = config.provider(kind);
        let api_key = settings.credential().ok_or_else(|| kind.missing_credential())?;

        Ok(Self {
            kind,
            client: build_client(kind.label(), config.request_timeout_secs)?,
            api_key: api_key.to_string(),
            model: settings.model.clone(),
            endpoint: format!("{}/chat/completions", settings.base_url.trim_end_matches('/')),
            temperature: config.temperature,
            retry: config.retry.clone(),
        })
    }

    fn request_body(&self, messages: &[Message]) -> Value {
        let messages: Vec<Value> = messages
            .iter()
            .map(|m| json!({ "role": m.role.as_str(), "content": m.content }))
            .collect();
        json!({
            "model": self.model,
            "messages": messages,
            "temperature": self.temperature,
        })
    }
}

/// Extract `choices[0].message.content`.
fn parse_reply(provider: &str, body: &Value) -> Result<String, ModelError> {
    body.pointer("/choices/0/message/content")
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| ModelError::InvalidResponse {
            provider: provider.to_string(),
            message: "missing choices[0].message.content".to_string(),
        })
}

#[async_trait]
impl ModelProvider for OpenAiCompatibleProvider {
    fn name(&self) -> &str {
        &self.model
    }

    fn kind(&self) -> ProviderKind {
        self.kind
    }

    #[instrument(
        skip_all,
        fields(provider = self.kind.label(), model = %self.model, messages = messages.len())
    )]
    async fn invoke(&self, messages: &[Message]) -> Result<String, ModelError> {
        let body = self.request_body(messages);
        let provider = self.kind.label();

        let response = self
            .retry
            .execute(|| {
                send_json(
                    provider,
                    self.client.post(&self.endpoint).bearer_auth(&self.api_key).json(&body),
                )
            })
            .await?;

        let reply = parse_reply(provider, &response)?;
        debug!(reply_len = reply.len(), "received completion");
        Ok(reply)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_first_choice() {
        let body = json!({"choices": [{"message": {"role": "assistant", "content": "Hello"}}]});
        assert_eq!(parse_reply("OpenAI", &body).unwrap(), "Hello");
    }

    #[test]
    fn empty_choices_is_invalid() {
        let body = json!({"choices": []});
        assert!(matches!(parse_reply("Groq", &body), Err(ModelError::InvalidResponse { .. })));
    }

    #[test]
    fn missing_key_is_reported_for_that_provider() {
        let err = OpenAiCompatibleProvider::new(ProviderKind::Groq, &ModelConfig::default())
            .err()
            .unwrap();
        assert!(matches!(
            err,
            ModelError::MissingCredential { ref env_var, .. } if env_var == "GROQ_API_KEY"
        ));
    }

    #[test]
    fn request_body_carries_roles_and_temperature() {
        let mut config = ModelConfig::default();
        config.openai.api_key = Some("sk-test".into());
        let provider = OpenAiCompatibleProvider::new(ProviderKind::OpenAi, &config).unwrap();

        let body = provider.request_body(&[Message::system("be brief"), Message::user("hi")]);
        assert_eq!(body["model"], "gpt-4o-mini");
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][1]["content"], "hi");
        assert!((body["temperature"].as_f64().unwrap() - 0.7).abs() < 1e-6);
    }
}

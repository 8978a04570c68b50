//! Google Gemini adapter over the `generateContent` REST endpoint.
//!
//! System messages are sent as `systemInstruction`; assistant turns use the
//! role `model`.

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{Value, json};
use tracing::{debug, instrument};

use crate::config::ModelConfig;
use crate::error::ModelError;
use crate::http::{build_client, send_json};
use crate::message::{Message, Role};
use crate::provider::{ModelProvider, ProviderKind};
use crate::retry::RetryPolicy;

const PROVIDER: &str = "Gemini";

/// Provider for Gemini models.
pub struct GeminiProvider {
    client: Client,
    api_key: String,
    model: String,
    endpoint: String,
    temperature: f32,
    retry: RetryPolicy,
}

impl GeminiProvider {
    /// Create a provider from the Gemini settings in `config`.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::MissingCredential`] if `GOOGLE_API_KEY` is not set.
    pub fn new(config: &ModelConfig) -> Result<Self, ModelError> {
        let settings = &config.gemini;
        let api_key =
            settings.credential().ok_or_else(|| ProviderKind::Gemini.missing_credential())?;

        Ok(Self {
            client: build_client(PROVIDER, config.request_timeout_secs)?,
            api_key: api_key.to_string(),
            model: settings.model.clone(),
            endpoint: format!(
                "{}/models/{}:generateContent",
                settings.base_url.trim_end_matches('/'),
                settings.model
            ),
            temperature: config.temperature,
            retry: config.retry.clone(),
        })
    }
}

/// Translate chat messages into a `generateContent` request body.
fn request_body(messages: &[Message], temperature: f32) -> Value {
    let system: Vec<&str> = messages
        .iter()
        .filter(|m| m.role == Role::System)
        .map(|m| m.content.as_str())
        .collect();

    let contents: Vec<Value> = messages
        .iter()
        .filter(|m| m.role != Role::System)
        .map(|m| {
            let role = if m.role == Role::Assistant { "model" } else { "user" };
            json!({ "role": role, "parts": [{ "text": m.content }] })
        })
        .collect();

    let mut body = json!({
        "contents": contents,
        "generationConfig": { "temperature": temperature },
    });
    if !system.is_empty() {
        body["systemInstruction"] = json!({ "parts": [{ "text": system.join("\n\n") }] });
    }
    body
}

/// Concatenate the text parts of the first candidate.
fn parse_reply(body: &Value) -> Result<String, ModelError> {
    let parts = body.pointer("/candidates/0/content/parts").and_then(Value::as_array).ok_or_else(
        || {
            let reason = body
                .pointer("/promptFeedback/blockReason")
                .and_then(Value::as_str)
                .map(|r| format!("prompt blocked: {r}"))
                .unwrap_or_else(|| "missing candidates[0].content.parts".to_string());
            ModelError::InvalidResponse { provider: PROVIDER.to_string(), message: reason }
        },
    )?;

    Ok(parts.iter().filter_map(|p| p.get("text").and_then(Value::as_str)).collect())
}

#[async_trait]
impl ModelProvider for GeminiProvider {
    fn name(&self) -> &str {
        &self.model
    }

    fn kind(&self) -> ProviderKind {
        ProviderKind::Gemini
    }

    #[instrument(
        skip_all,
        fields(provider = PROVIDER, model = %self.model, messages = messages.len())
    )]
    async fn invoke(&self, messages: &[Message]) -> Result<String, ModelError> {
        let body = request_body(messages, self.temperature);

        let response = self
            .retry
            .execute(|| {
                send_json(
                    PROVIDER,
                    self.client
                        .post(&self.endpoint)
                        .header("x-goog-api-key", &self.api_key)
                        .json(&body),
                )
            })
            .await?;

        let reply = parse_reply(&response)?;
        debug!(reply_len = reply.len(), "received generation");
        Ok(reply)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn system_messages_become_system_instruction() {
        let body = request_body(
            &[
                Message::system("You are helpful."),
                Message::user("Hi"),
                Message::assistant("Hello"),
            ],
            0.7,
        );
        assert_eq!(body["systemInstruction"]["parts"][0]["text"], "You are helpful.");
        assert_eq!(body["contents"].as_array().unwrap().len(), 2);
        assert_eq!(body["contents"][0]["role"], "user");
        assert_eq!(body["contents"][1]["role"], "model");
    }

    #[test]
    fn no_system_instruction_without_system_messages() {
        let body = request_body(&[Message::user("Hi")], 0.2);
        assert!(body.get("systemInstruction").is_none());
    }

    #[test]
    fn joins_text_parts() {
        let body = json!({"candidates": [{"content": {"parts": [{"text": "Hel"}, {"text": "lo"}]}}]});
        assert_eq!(parse_reply(&body).unwrap(), "Hello");
    }

    #[test]
    fn blocked_prompt_is_reported() {
        let body = json!({"promptFeedback": {"blockReason": "SAFETY"}});
        let err = parse_reply(&body).unwrap_err();
        assert!(err.to_string().contains("SAFETY"));
    }
}

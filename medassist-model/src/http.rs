//! Shared HTTP plumbing for the provider adapters.

use std::time::Duration;

use reqwest::{Client, RequestBuilder, Response};
use serde_json::Value;

use crate::error::ModelError;

/// Build a client whose requests fail after `timeout_secs`.
pub(crate) fn build_client(provider: &str, timeout_secs: u64) -> Result<Client, ModelError> {
    Client::builder().timeout(Duration::from_secs(timeout_secs)).build().map_err(|e| {
        ModelError::Connection {
            provider: provider.to_string(),
            message: format!("failed to build HTTP client: {e}"),
        }
    })
}

/// Send a request and decode a successful JSON body.
pub(crate) async fn send_json(
    provider: &str,
    request: RequestBuilder,
) -> Result<Value, ModelError> {
    let response = request.send().await.map_err(|e| transport_error(provider, e))?;
    let response = check_response(provider, response).await?;
    response.json::<Value>().await.map_err(|e| ModelError::InvalidResponse {
        provider: provider.to_string(),
        message: format!("failed to decode response body: {e}"),
    })
}

/// Turn a non-success status into [`ModelError::Api`].
async fn check_response(provider: &str, response: Response) -> Result<Response, ModelError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(ModelError::Api {
        provider: provider.to_string(),
        status: status.as_u16(),
        message: error_message(&body),
    })
}

/// Pull `error.message` out of a JSON error body, falling back to the raw text.
fn error_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v.pointer("/error/message").and_then(Value::as_str).map(str::to_string))
        .unwrap_or_else(|| body.trim().to_string())
}

fn transport_error(provider: &str, err: reqwest::Error) -> ModelError {
    if err.is_timeout() {
        ModelError::Timeout { provider: provider.to_string() }
    } else {
        ModelError::Connection { provider: provider.to_string(), message: err.to_string() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_nested_error_message() {
        let body = r#"{"error": {"message": "Invalid API Key", "type": "invalid_request_error"}}"#;
        assert_eq!(error_message(body), "Invalid API Key");
    }

    #[test]
    fn falls_back_to_raw_body() {
        assert_eq!(error_message(" upstream unavailable \n"), "upstream unavailable");
    }
}

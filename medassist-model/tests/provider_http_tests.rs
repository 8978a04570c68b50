//! HTTP-level tests for the provider adapters against a mock server.

use medassist_model::{
    Message, ModelConfig, ModelError, ProviderKind, RetryPolicy, create_provider,
};
use mockito::{Matcher, Server};
use serde_json::json;

fn config_for(kind: ProviderKind, base_url: &str) -> ModelConfig {
    let mut config = ModelConfig { retry: RetryPolicy::new(2, 1, 5), ..ModelConfig::default() };
    let provider = config.provider_mut(kind);
    provider.api_key = Some("test-key".to_string());
    provider.base_url = base_url.to_string();
    config
}

fn chat_completion(content: &str) -> String {
    json!({
        "id": "chatcmpl-1",
        "choices": [{"index": 0, "message": {"role": "assistant", "content": content}}]
    })
    .to_string()
}

#[tokio::test]
async fn openai_sends_bearer_token_and_returns_content() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/chat/completions")
        .match_header("authorization", "Bearer test-key")
        .match_body(Matcher::PartialJson(json!({
            "model": "gpt-4o-mini",
            "messages": [
                {"role": "system", "content": "Be accurate."},
                {"role": "user", "content": "What is anemia?"}
            ]
        })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(chat_completion("Anemia is a low red blood cell count."))
        .expect(1)
        .create_async()
        .await;

    let provider =
        create_provider(ProviderKind::OpenAi, &config_for(ProviderKind::OpenAi, &server.url()))
            .unwrap();
    let reply = provider
        .invoke(&[Message::system("Be accurate."), Message::user("What is anemia?")])
        .await
        .unwrap();

    assert_eq!(reply, "Anemia is a low red blood cell count.");
    assert_eq!(provider.kind(), ProviderKind::OpenAi);
    mock.assert_async().await;
}

#[tokio::test]
async fn groq_retries_server_errors_then_succeeds() {
    let mut server = Server::new_async().await;
    let failing = server
        .mock("POST", "/chat/completions")
        .with_status(503)
        .with_body(r#"{"error": {"message": "over capacity"}}"#)
        .expect(1)
        .create_async()
        .await;
    let ok = server
        .mock("POST", "/chat/completions")
        .with_status(200)
        .with_body(chat_completion("Rest and fluids."))
        .expect(1)
        .create_async()
        .await;

    let provider =
        create_provider(ProviderKind::Groq, &config_for(ProviderKind::Groq, &server.url()))
            .unwrap();
    let reply = provider.invoke(&[Message::user("Cold remedies?")]).await.unwrap();

    assert_eq!(reply, "Rest and fluids.");
    failing.assert_async().await;
    ok.assert_async().await;
}

#[tokio::test]
async fn client_errors_are_not_retried() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/chat/completions")
        .with_status(401)
        .with_body(r#"{"error": {"message": "Invalid API Key"}}"#)
        .expect(1)
        .create_async()
        .await;

    let provider =
        create_provider(ProviderKind::Groq, &config_for(ProviderKind::Groq, &server.url()))
            .unwrap();
    let err = provider.invoke(&[Message::user("hi")]).await.unwrap_err();

    match err {
        ModelError::Api { status, message, .. } => {
            assert_eq!(status, 401);
            assert_eq!(message, "Invalid API Key");
        }
        other => panic!("unexpected error: {other:?}"),
    }
    mock.assert_async().await;
}

#[tokio::test]
async fn retries_are_bounded() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/chat/completions")
        .with_status(429)
        .with_body(r#"{"error": {"message": "rate limited"}}"#)
        .expect(3)
        .create_async()
        .await;

    let provider =
        create_provider(ProviderKind::OpenAi, &config_for(ProviderKind::OpenAi, &server.url()))
            .unwrap();
    let err = provider.invoke(&[Message::user("hi")]).await.unwrap_err();

    assert!(matches!(err, ModelError::Api { status: 429, .. }));
    mock.assert_async().await;
}

#[tokio::test]
async fn gemini_uses_system_instruction_and_model_role() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/models/gemini-1.5-flash:generateContent")
        .match_header("x-goog-api-key", "test-key")
        .match_body(Matcher::PartialJson(json!({
            "systemInstruction": {"parts": [{"text": "You are a medical assistant."}]},
            "contents": [
                {"role": "user", "parts": [{"text": "Hi"}]},
                {"role": "model", "parts": [{"text": "Hello!"}]},
                {"role": "user", "parts": [{"text": "What causes migraines?"}]}
            ]
        })))
        .with_status(200)
        .with_body(
            json!({
                "candidates": [{"content": {"role": "model", "parts": [{"text": "Triggers vary."}]}}]
            })
            .to_string(),
        )
        .create_async()
        .await;

    let provider =
        create_provider(ProviderKind::Gemini, &config_for(ProviderKind::Gemini, &server.url()))
            .unwrap();
    let reply = provider
        .invoke(&[
            Message::system("You are a medical assistant."),
            Message::user("Hi"),
            Message::assistant("Hello!"),
            Message::user("What causes migraines?"),
        ])
        .await
        .unwrap();

    assert_eq!(reply, "Triggers vary.");
    mock.assert_async().await;
}

#[tokio::test]
async fn malformed_success_body_is_invalid_response() {
    let mut server = Server::new_async().await;
    server
        .mock("POST", "/chat/completions")
        .with_status(200)
        .with_body(r#"{"unexpected": true}"#)
        .create_async()
        .await;

    let provider =
        create_provider(ProviderKind::OpenAi, &config_for(ProviderKind::OpenAi, &server.url()))
            .unwrap();
    let err = provider.invoke(&[Message::user("hi")]).await.unwrap_err();
    assert!(matches!(err, ModelError::InvalidResponse { .. }));
}

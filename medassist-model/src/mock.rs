//! Scripted provider for tests and offline runs.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::ModelError;
use crate::message::{Message, Role};
use crate::provider::{ModelProvider, ProviderKind};

/// A [`ModelProvider`] that replays queued replies and records every call.
///
/// When the queue is empty it echoes the last user message.
#[derive(Debug)]
pub struct MockProvider {
    name: String,
    kind: ProviderKind,
    replies: Mutex<VecDeque<Result<String, ModelError>>>,
    calls: Mutex<Vec<Vec<Message>>>,
}

impl MockProvider {
    /// Create a mock with no queued replies.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: ProviderKind::Groq,
            replies: Mutex::new(VecDeque::new()),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Report a different provider kind.
    pub fn with_kind(mut self, kind: ProviderKind) -> Self {
        self.kind = kind;
        self
    }

    /// Queue a successful reply.
    pub fn with_reply(self, reply: impl Into<String>) -> Self {
        self.push(Ok(reply.into()));
        self
    }

    /// Queue a failure.
    pub fn with_error(self, error: ModelError) -> Self {
        self.push(Err(error));
        self
    }

    /// Conversations received so far, oldest first.
    pub fn calls(&self) -> Vec<Vec<Message>> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    fn push(&self, reply: Result<String, ModelError>) {
        if let Ok(mut replies) = self.replies.lock() {
            replies.push_back(reply);
        }
    }
}

#[async_trait]
impl ModelProvider for MockProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> ProviderKind {
        self.kind
    }

    async fn invoke(&self, messages: &[Message]) -> Result<String, ModelError> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(messages.to_vec());
        }
        let queued = self.replies.lock().ok().and_then(|mut r| r.pop_front());
        match queued {
            Some(reply) => reply,
            None => Ok(messages.iter().rev().find(|m| m.role == Role::User).map_or_else(
                String::new,
                |m| format!("echo: {}", m.content),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn replays_then_echoes() {
        let mock = MockProvider::new("mock").with_reply("first");
        assert_eq!(mock.invoke(&[Message::user("a")]).await.unwrap(), "first");
        assert_eq!(mock.invoke(&[Message::user("b")]).await.unwrap(), "echo: b");
        assert_eq!(mock.calls().len(), 2);
    }
}

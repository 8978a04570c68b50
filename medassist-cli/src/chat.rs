//! One conversation: history, per-session settings and the turn pipeline.

use std::path::Path;
use std::sync::Arc;

use medassist_model::{Message, ModelProvider};
use tracing::{info, warn};

use crate::app::AppContext;
use crate::config::PromptSettings;
use crate::prompt::{PromptAssembler, ResponseMode, build_messages};

/// File written by [`ChatSession::export`] when no path is given.
pub const DEFAULT_EXPORT_FILE: &str = "chat_history.txt";

/// Reply used when no provider is selected.
pub const NO_PROVIDER_REPLY: &str = "No model provider is configured. \
Set GROQ_API_KEY, OPENAI_API_KEY or GOOGLE_API_KEY and select one with /provider.";

/// User-adjustable settings of a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSettings {
    /// Requested answer length.
    pub mode: ResponseMode,
    /// Add knowledge-base context to prompts.
    pub use_rag: bool,
    /// Add web search results to prompts.
    pub use_web: bool,
    /// Base system prompt.
    pub system_prompt: String,
}

impl SessionSettings {
    /// Initial settings: retrieval on, web search off.
    pub fn from_config(prompt: &PromptSettings) -> Self {
        Self {
            mode: prompt.default_mode,
            use_rag: true,
            use_web: false,
            system_prompt: prompt.system_prompt.clone(),
        }
    }
}

/// A chat with one user.
pub struct ChatSession {
    /// Current settings.
    pub settings: SessionSettings,
    assembler: PromptAssembler,
    model: Option<Arc<dyn ModelProvider>>,
    history: Vec<Message>,
}

impl std::fmt::Debug for ChatSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatSession")
            .field("settings", &self.settings)
            .field("model", &self.model.as_ref().map(|m| m.name().to_string()))
            .field("turns", &self.history.len())
            .finish()
    }
}

impl ChatSession {
    /// Start an empty session.
    pub fn new(prompt: &PromptSettings, model: Option<Arc<dyn ModelProvider>>) -> Self {
        Self {
            settings: SessionSettings::from_config(prompt),
            assembler: PromptAssembler::new(prompt.concise_max_words, prompt.detailed_max_words),
            model,
            history: Vec::new(),
        }
    }

    /// The selected model, if any.
    pub fn model(&self) -> Option<&Arc<dyn ModelProvider>> {
        self.model.as_ref()
    }

    /// Switch to another model; history is kept.
    pub fn set_model(&mut self, model: Arc<dyn ModelProvider>) {
        info!(provider = model.kind().label(), model = model.name(), "switched model");
        self.model = Some(model);
    }

    /// User and assistant messages so far.
    pub fn history(&self) -> &[Message] {
        &self.history
    }

    /// Forget the conversation.
    pub fn clear(&mut self) {
        self.history.clear();
    }

    /// Answer `query`, recording both sides in the history.
    ///
    /// Retrieval failures are logged and the turn proceeds without
    /// knowledge-base context. A provider failure becomes the reply text
    /// `Error getting response: ...`.
    pub async fn respond(&mut self, ctx: &AppContext, query: &str) -> String {
        let Some(model) = self.model.clone() else {
            return NO_PROVIDER_REPLY.to_string();
        };

        self.history.push(Message::user(query));

        let rag_context = if self.settings.use_rag {
            ctx.retrieve(query).await.unwrap_or_else(|e| {
                warn!(error = %e, "retrieval failed, answering without knowledge base");
                String::new()
            })
        } else {
            String::new()
        };
        let web_context =
            if self.settings.use_web { ctx.web_context(query).await } else { String::new() };

        let system_prompt = self.assembler.assemble(
            &self.settings.system_prompt,
            self.settings.mode,
            &rag_context,
            &web_context,
        );
        let messages = build_messages(&system_prompt, &self.history);

        let reply = match model.invoke(&messages).await {
            Ok(reply) => reply,
            Err(e) => {
                warn!(provider = model.kind().label(), error = %e, "model call failed");
                format!("Error getting response: {e}")
            }
        };

        self.history.push(Message::assistant(reply.clone()));
        reply
    }

    /// The history as `ROLE: content` blocks separated by blank lines.
    pub fn transcript(&self) -> String {
        self.history
            .iter()
            .map(|m| format!("{}: {}", m.role.as_str().to_uppercase(), m.content))
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    /// Write [`transcript`](Self::transcript) to `path`.
    ///
    /// # Errors
    ///
    /// Returns the underlying I/O error.
    pub fn export(&self, path: &Path) -> std::io::Result<()> {
        std::fs::write(path, self.transcript())?;
        info!(path = %path.display(), messages = self.history.len(), "exported chat history");
        Ok(())
    }
}

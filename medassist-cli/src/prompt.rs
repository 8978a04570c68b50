//! System prompt assembly.
//!
//! The system prompt sent with every turn is built from, in order:
//! 1. The user-editable base prompt
//! 2. A response-length directive for the selected [`ResponseMode`]
//! 3. Retrieved knowledge-base context and web search results, when present

use std::fmt;
use std::str::FromStr;

use medassist_model::Message;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Heading introducing the context sections.
pub const CONTEXT_PREAMBLE: &str = "\n\nUse the following context to answer the user's question:\n";
/// Heading of the knowledge-base section.
pub const KNOWLEDGE_BASE_HEADER: &str = "\n\n=== Knowledge Base Context ===\n";
/// Heading of the web search section.
pub const WEB_SEARCH_HEADER: &str = "\n\n=== Web Search Results ===\n";

/// Requested answer length.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseMode {
    /// Short, to-the-point answers.
    Concise,
    /// Longer answers with explanations.
    #[default]
    Detailed,
}

impl ResponseMode {
    /// Lowercase name, as accepted by [`FromStr`].
    pub fn as_str(self) -> &'static str {
        match self {
            ResponseMode::Concise => "concise",
            ResponseMode::Detailed => "detailed",
        }
    }
}

impl fmt::Display for ResponseMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error parsing a [`ResponseMode`].
#[derive(Debug, Error, PartialEq, Eq)]
#[error("Unknown response mode '{0}', expected 'concise' or 'detailed'")]
pub struct ParseModeError(String);

impl FromStr for ResponseMode {
    type Err = ParseModeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "concise" => Ok(ResponseMode::Concise),
            "detailed" => Ok(ResponseMode::Detailed),
            other => Err(ParseModeError(other.to_string())),
        }
    }
}

/// Builds the per-turn system prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PromptAssembler {
    /// Word ceiling stated in concise mode.
    pub concise_max_words: usize,
    /// Word ceiling stated in detailed mode.
    pub detailed_max_words: usize,
}

impl Default for PromptAssembler {
    fn default() -> Self {
        Self { concise_max_words: 150, detailed_max_words: 500 }
    }
}

impl PromptAssembler {
    /// Create an assembler with the given word ceilings.
    pub fn new(concise_max_words: usize, detailed_max_words: usize) -> Self {
        Self { concise_max_words, detailed_max_words }
    }

    /// The length directive appended for `mode`.
    pub fn mode_directive(&self, mode: ResponseMode) -> String {
        match mode {
            ResponseMode::Concise => format!(
                "\n\nIMPORTANT: Provide a CONCISE response (maximum {} words). Be brief and to the point.",
                self.concise_max_words
            ),
            ResponseMode::Detailed => format!(
                "\n\nIMPORTANT: Provide a DETAILED response (maximum {} words). Include comprehensive explanations and context.",
                self.detailed_max_words
            ),
        }
    }

    /// Assemble the system prompt.
    ///
    /// Empty `rag_context` or `web_context` sections are omitted, and the
    /// context preamble is only added when at least one is present. Nothing
    /// is truncated.
    ///
    /// ```
    /// use medassist_cli::prompt::{PromptAssembler, ResponseMode};
    ///
    /// let prompt = PromptAssembler::new(150, 500).assemble("Base.", ResponseMode::Concise, "", "");
    /// assert_eq!(
    ///     prompt,
    ///     "Base.\n\nIMPORTANT: Provide a CONCISE response (maximum 150 words). Be brief and to the point."
    /// );
    /// ```
    pub fn assemble(
        &self,
        base: &str,
        mode: ResponseMode,
        rag_context: &str,
        web_context: &str,
    ) -> String {
        let mut context = String::new();
        if !rag_context.is_empty() {
            context.push_str(KNOWLEDGE_BASE_HEADER);
            context.push_str(rag_context);
        }
        if !web_context.is_empty() {
            context.push_str(WEB_SEARCH_HEADER);
            context.push_str(web_context);
        }

        let mut prompt = String::with_capacity(base.len() + context.len() + 160);
        prompt.push_str(base);
        prompt.push_str(&self.mode_directive(mode));
        if !context.is_empty() {
            prompt.push_str(CONTEXT_PREAMBLE);
            prompt.push_str(&context);
        }
        prompt
    }
}

/// One system message followed by `history` in order.
pub fn build_messages(system_prompt: &str, history: &[Message]) -> Vec<Message> {
    std::iter::once(Message::system(system_prompt)).chain(history.iter().cloned()).collect()
}

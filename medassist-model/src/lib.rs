//! # medassist-model
//!
//! Hosted chat models for the MedAssist assistant.
//!
//! ## Overview
//!
//! - [`ModelProvider`] - send a conversation, get the reply text
//! - [`OpenAiCompatibleProvider`] - OpenAI and Groq chat completions
//! - [`GeminiProvider`] - Google Gemini `generateContent`
//! - [`MockProvider`] - scripted replies for tests
//!
//! Every adapter uses a request timeout and retries transient failures
//! (timeouts, connection errors, 429, 5xx) with exponential backoff.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use medassist_model::{Message, ModelConfig, ProviderKind, available_providers, create_provider};
//!
//! # async fn run() -> Result<(), medassist_model::ModelError> {
//! let config = ModelConfig::default().with_env_credentials();
//! let kind = available_providers(&config).first().copied().unwrap_or(ProviderKind::Groq);
//! let model = create_provider(kind, &config)?;
//! let reply = model.invoke(&[Message::user("What is hypertension?")]).await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Default Models
//!
//! | Provider | Model | Key |
//! |----------|-------|-----|
//! | Groq | `llama-3.3-70b-versatile` | `GROQ_API_KEY` |
//! | OpenAI | `gpt-4o-mini` | `OPENAI_API_KEY` |
//! | Gemini | `gemini-1.5-flash` | `GOOGLE_API_KEY` |

pub mod config;
pub mod error;
pub mod gemini;
mod http;
pub mod message;
pub mod mock;
pub mod openai_compat;
pub mod provider;
pub mod retry;

pub use config::{ModelConfig, ProviderConfig};
pub use error::ModelError;
pub use gemini::GeminiProvider;
pub use message::{Message, Role};
pub use mock::MockProvider;
pub use openai_compat::OpenAiCompatibleProvider;
pub use provider::{ModelProvider, ProviderKind, available_providers, create_provider};
pub use retry::RetryPolicy;

//! # medassist-cli
//!
//! Terminal front end for the MedAssist healthcare FAQ assistant.
//!
//! - [`config`] loads [`AppConfig`] from defaults, `medassist.toml` and the environment
//! - [`prompt`] assembles the per-turn system prompt
//! - [`app::AppContext`] owns the retrieval system and web search
//! - [`chat::ChatSession`] runs one conversation
//! - [`repl`] reads commands and questions from the terminal

pub mod app;
pub mod chat;
pub mod config;
pub mod error;
pub mod prompt;
pub mod repl;
pub mod telemetry;

pub use app::{AppContext, UploadReport};
pub use chat::{ChatSession, SessionSettings};
pub use config::{AppConfig, ConfigError};
pub use error::AppError;
pub use prompt::{PromptAssembler, ResponseMode, build_messages};

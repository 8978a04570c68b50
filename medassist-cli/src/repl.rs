//! The interactive loop and its slash commands.

use std::path::PathBuf;

use medassist_model::ProviderKind;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use thiserror::Error;

use crate::app::{AppContext, UploadReport};
use crate::chat::{ChatSession, DEFAULT_EXPORT_FILE};
use crate::prompt::ResponseMode;

/// Help text for `/help`.
pub const HELP: &str = "\
Commands:
  /help                     Show this help
  /provider [name]          Show or switch the model provider (groq, openai, gemini)
  /mode concise|detailed    Set the response length
  /rag on|off               Use the knowledge base
  /web on|off               Use web search
  /system [prompt]          Show or replace the system prompt
  /upload <path>            Add a .txt or .pdf file to the knowledge base
  /clear                    Clear the conversation
  /export [path]            Save the conversation (default chat_history.txt)
  /quit                     Exit
Anything else is sent to the assistant.";

/// A parsed slash command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Help,
    Provider(Option<ProviderKind>),
    Mode(ResponseMode),
    Rag(bool),
    Web(bool),
    System(Option<String>),
    Upload(PathBuf),
    Clear,
    Export(Option<PathBuf>),
    Quit,
}

/// One line of input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    /// Blank line.
    Empty,
    /// A question for the assistant.
    Chat(String),
    /// A slash command.
    Command(Command),
}

/// A slash command that could not be parsed.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum CommandError {
    #[error("Unknown command '/{0}'. Type /help for a list.")]
    Unknown(String),

    #[error("Usage: {0}")]
    Usage(&'static str),

    #[error("{0}")]
    Invalid(String),
}

/// Classify a line of input.
///
/// # Errors
///
/// Returns [`CommandError`] for a malformed slash command.
pub fn parse_input(line: &str) -> Result<Input, CommandError> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(Input::Empty);
    }
    let Some(rest) = line.strip_prefix('/') else {
        return Ok(Input::Chat(line.to_string()));
    };

    let (name, arg) = match rest.split_once(char::is_whitespace) {
        Some((name, arg)) => (name, Some(arg.trim()).filter(|a| !a.is_empty())),
        None => (rest, None),
    };

    let command = match name.to_ascii_lowercase().as_str() {
        "help" | "h" | "?" => Command::Help,
        "provider" => Command::Provider(
            arg.map(str::parse::<ProviderKind>)
                .transpose()
                .map_err(|e| CommandError::Invalid(e.to_string()))?,
        ),
        "mode" => {
            let arg = arg.ok_or(CommandError::Usage("/mode concise|detailed"))?;
            Command::Mode(arg.parse().map_err(|e: crate::prompt::ParseModeError| {
                CommandError::Invalid(e.to_string())
            })?)
        }
        "rag" => Command::Rag(parse_switch(arg, "/rag on|off")?),
        "web" => Command::Web(parse_switch(arg, "/web on|off")?),
        "system" => Command::System(arg.map(str::to_string)),
        "upload" => Command::Upload(
            arg.map(PathBuf::from).ok_or(CommandError::Usage("/upload <path>"))?,
        ),
        "clear" => Command::Clear,
        "export" => Command::Export(arg.map(PathBuf::from)),
        "quit" | "exit" | "q" => Command::Quit,
        other => return Err(CommandError::Unknown(other.to_string())),
    };
    Ok(Input::Command(command))
}

fn parse_switch(arg: Option<&str>, usage: &'static str) -> Result<bool, CommandError> {
    match arg.map(str::to_ascii_lowercase).as_deref() {
        Some("on" | "true" | "yes") => Ok(true),
        Some("off" | "false" | "no") => Ok(false),
        _ => Err(CommandError::Usage(usage)),
    }
}

/// What the loop should do after a line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Print the text (if any) and read the next line.
    Continue(String),
    /// Leave the loop.
    Quit,
}

/// Handle one line of input.
pub async fn handle_line(ctx: &AppContext, session: &mut ChatSession, line: &str) -> Outcome {
    match parse_input(line) {
        Ok(Input::Empty) => Outcome::Continue(String::new()),
        Ok(Input::Chat(query)) => Outcome::Continue(session.respond(ctx, &query).await),
        Ok(Input::Command(command)) => execute(ctx, session, command).await,
        Err(e) => Outcome::Continue(e.to_string()),
    }
}

/// Run a slash command.
pub async fn execute(ctx: &AppContext, session: &mut ChatSession, command: Command) -> Outcome {
    let text = match command {
        Command::Help => HELP.to_string(),
        Command::Provider(None) => {
            let current = session
                .model()
                .map_or("none".to_string(), |m| format!("{} ({})", m.kind(), m.name()));
            let available: Vec<&str> =
                ctx.available_providers().into_iter().map(ProviderKind::label).collect();
            format!("Current provider: {current}\nAvailable: {}", available.join(", "))
        }
        Command::Provider(Some(kind)) => match ctx.provider(kind) {
            Ok(model) => {
                let text = format!("Using {} ({})", kind, model.name());
                session.set_model(model);
                text
            }
            Err(e) => format!("Error initializing model: {e}"),
        },
        Command::Mode(mode) => {
            session.settings.mode = mode;
            format!("Response mode: {mode}")
        }
        Command::Rag(on) => {
            session.settings.use_rag = on;
            format!("Knowledge base {}", if on { "enabled" } else { "disabled" })
        }
        Command::Web(on) => {
            session.settings.use_web = on;
            format!("Web search {}", if on { "enabled" } else { "disabled" })
        }
        Command::System(None) => session.settings.system_prompt.clone(),
        Command::System(Some(prompt)) => {
            session.settings.system_prompt = prompt;
            "System prompt updated".to_string()
        }
        Command::Upload(path) => match ctx.upload_path(&path).await {
            Ok(UploadReport { chunks_added, persist_error: None }) => {
                format!("Added {chunks_added} chunks to knowledge base!")
            }
            Ok(UploadReport { chunks_added, persist_error: Some(e) }) => {
                format!("Added {chunks_added} chunks to knowledge base (not saved: {e})")
            }
            Err(e) => format!("Error processing document: {e}"),
        },
        Command::Clear => {
            session.clear();
            "Conversation cleared".to_string()
        }
        Command::Export(path) => {
            let path = path.unwrap_or_else(|| PathBuf::from(DEFAULT_EXPORT_FILE));
            match session.export(&path) {
                Ok(()) => format!("Saved conversation to {}", path.display()),
                Err(e) => format!("Error exporting conversation: {e}"),
            }
        }
        Command::Quit => return Outcome::Quit,
    };
    Outcome::Continue(text)
}

/// Read lines from the terminal until `/quit`, Ctrl-D or Ctrl-C.
///
/// # Errors
///
/// Returns an error if the terminal cannot be read.
pub async fn run(ctx: &AppContext, session: &mut ChatSession) -> anyhow::Result<()> {
    let mut editor = DefaultEditor::new()?;
    println!("Healthcare FAQ Assistant. Type /help for commands.");

    loop {
        let line = match editor.readline("> ") {
            Ok(line) => line,
            Err(ReadlineError::Interrupted | ReadlineError::Eof) => break,
            Err(e) => return Err(e.into()),
        };
        if !line.trim().is_empty() {
            let _ = editor.add_history_entry(line.as_str());
        }

        match handle_line(ctx, session, &line).await {
            Outcome::Continue(text) if text.is_empty() => {}
            Outcome::Continue(text) => println!("{text}\n"),
            Outcome::Quit => break,
        }
    }
    Ok(())
}

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use medassist_cli::{AppConfig, AppContext, ChatSession, repl, telemetry};
use medassist_model::ProviderKind;
use tracing::warn;

/// Healthcare FAQ assistant with retrieval and optional web search.
#[derive(Parser, Debug)]
#[command(name = "medassist", version, about)]
struct Args {
    /// Configuration file (defaults to ./medassist.toml when present)
    #[arg(short, long, env = "MEDASSIST_CONFIG")]
    config: Option<PathBuf>,

    /// Model provider to start with: groq, openai or gemini
    #[arg(short, long)]
    provider: Option<ProviderKind>,

    /// Ask a single question, print the answer and exit
    #[arg(short, long)]
    ask: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let args = Args::parse();

    let config = AppConfig::load(args.config.as_deref()).context("loading configuration")?;
    telemetry::init_tracing(&config.logging);

    let ctx = AppContext::new(config)?;
    let available = ctx.available_providers();
    if available.is_empty() {
        eprintln!(
            "No API keys configured. Set GROQ_API_KEY, OPENAI_API_KEY or GOOGLE_API_KEY (a .env file works)."
        );
    }

    let kind =
        args.provider.or(ctx.config().default_provider).or_else(|| available.first().copied());
    let model = match kind.map(|kind| ctx.provider(kind)) {
        Some(Ok(model)) => Some(model),
        Some(Err(e)) => {
            eprintln!("Error initializing model: {e}");
            None
        }
        None => None,
    };

    if let Err(e) = ctx.rag().await {
        warn!(error = %e, "knowledge base unavailable, continuing without retrieval");
    }

    let mut session = ChatSession::new(&ctx.config().prompt, model);
    match args.ask {
        Some(question) => println!("{}", session.respond(&ctx, &question).await),
        None => repl::run(&ctx, &mut session).await?,
    }
    Ok(())
}

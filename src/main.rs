//! Command-line entry point for the VertoSewa assistant.
//!
//! | Command | Purpose |
//! |---------|---------|
//! | `verto serve` | Build the index and run the HTTP API |
//! | `verto chat` | Ask one question from the terminal |
//! | `verto index` | Build the corpus index and print its shape |
//!
//! Examples:
//!
//! ```text
//! verto serve --config config/verto.toml
//! verto chat "When are hostel fees due?"
//! verto chat --session advisory "What is the reappear process?"
//! verto index
//! ```

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;
use tracing_subscriber::EnvFilter;

use verto_sewa::chat::ChatService;
use verto_sewa::config::{load_config, Config};
use verto_sewa::models::SourceKind;
use verto_sewa::replies::WELCOME;
use verto_sewa::server::run_server;

#[derive(Parser)]
#[command(name = "verto", version, about = "Campus assistant for Lovely Professional University")]
struct Cli {
    /// Path to the configuration file
    #[arg(long, global = true, default_value = "./config/verto.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the corpus index and serve the HTTP API
    Serve,
    /// Ask one question from the terminal
    Chat {
        /// The question to ask
        message: String,
        /// Session id to converse under
        #[arg(long, default_value = "cli")]
        session: String,
    },
    /// Build the corpus index once and print its shape
    Index,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Serve => serve(&cli.config).await,
        Commands::Chat { message, session } => chat(&cli.config, &message, &session).await,
        Commands::Index => index(&cli.config).await,
    }
}

async fn serve(config_path: &std::path::Path) -> Result<()> {
    let config = load_config(config_path)?;
    let service = Arc::new(ChatService::from_config(config.clone())?);

    service.refresh().await;

    if config.corpus.refresh == "interval" {
        let interval = Duration::from_secs(config.corpus.refresh_interval_secs);
        let refresher = service.clone();
        tokio::spawn(async move {
            loop {
                tokio::time::sleep(interval).await;
                refresher.refresh().await;
            }
        });
    }

    run_server(&config, service).await
}

async fn chat(config_path: &std::path::Path, message: &str, session: &str) -> Result<()> {
    let config = if config_path.exists() {
        load_config(config_path)?
    } else {
        warn!("Config file not found, using defaults: {}", config_path.display());
        Config::default()
    };

    let service = ChatService::from_config(config)?;
    service.refresh().await;

    if service.begin_session(session) {
        println!("{}", WELCOME);
    }

    let reply = service.handle(session, message).await;
    println!("{}", reply);

    Ok(())
}

async fn index(config_path: &std::path::Path) -> Result<()> {
    let config = load_config(config_path)?;
    let service = ChatService::from_config(config)?;

    let index = service.refresh().await;

    println!("Corpus index built.");
    println!(
        "  administrative chunks: {}",
        index.count_by_source(SourceKind::Administrative)
    );
    println!(
        "  static chunks: {}",
        index.count_by_source(SourceKind::Static)
    );
    println!("  total chunks: {}", index.chunk_count());
    println!("  static corpus bytes: {}", index.static_text().len());

    Ok(())
}

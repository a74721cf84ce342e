//! # Lectern CLI
//!
//! ```bash
//! lectern --config ./lectern.toml <command>
//! ```
//!
//! | Command | Description |
//! |---------|-------------|
//! | `lectern serve` | Build the index and start the HTTP service |
//! | `lectern ask "<question>"` | Build the index, answer one question, exit |
//!
//! Both commands run the full startup pipeline (corpus load → chunking →
//! embedding → index build); the index lives only in memory and is rebuilt
//! on every start.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use lectern::config::load_config;
use lectern::server::run_server;
use lectern::service::initialize;

/// Lectern — retrieval-augmented question answering over a local academic
/// document corpus.
#[derive(Parser)]
#[command(
    name = "lectern",
    about = "Retrieval-augmented question answering over a local document corpus",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./lectern.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the index and start the HTTP question-answering service.
    Serve,

    /// Answer a single question from the command line and exit.
    Ask {
        /// The question to answer.
        question: String,

        /// Model tag: `gemini`, `llama`, or `hybrid`.
        #[arg(long, default_value = "hybrid")]
        model: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = load_config(&cli.config)?;

    match cli.command {
        Commands::Serve => {
            let service = initialize(&config).await?;
            run_server(&config.server, service).await
        }
        Commands::Ask { question, model } => {
            let service = initialize(&config).await?;
            let answer = service.router.answer(&question, &model).await?;
            println!("[{}] {}", answer.source, answer.text);
            Ok(())
        }
    }
}

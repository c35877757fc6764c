use std::path::PathBuf;

use clap::{Parser, Subcommand};
use rag_chatbot::commands::{ingest_documents, init_config, serve_chatbot};
use rag_chatbot::config::{load_config, show_config};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "rag-chatbot")]
#[command(about = "A document-grounded chatbot over a folder of PDFs")]
#[command(version)]
struct Cli {
    /// Base directory holding chatbot.toml, documents, the index and web assets
    #[arg(long, global = true, default_value = ".")]
    dir: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the chat web service
    Serve,
    /// Rebuild the vector index from the PDF source directory
    Ingest,
    /// Show or create the configuration file
    Config {
        /// Show the effective configuration
        #[arg(long, conflicts_with = "init")]
        show: bool,
        /// Write a configuration file with default values
        #[arg(long)]
        init: bool,
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

    match cli.command {
        Commands::Serve => {
            serve_chatbot(&cli.dir).await?;
        }
        Commands::Ingest => {
            ingest_documents(&cli.dir).await?;
        }
        Commands::Config { init: true, .. } => {
            init_config(&cli.dir)?;
        }
        Commands::Config { .. } => {
            show_config(&load_config(&cli.dir)?)?;
        }
    }

    Ok(())
}

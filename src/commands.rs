use anyhow::{Context, Result};
use std::path::Path;
use std::sync::Arc;
use tracing::info;

use crate::config::{Config, load_config};
use crate::embeddings::{Embedder, OllamaClient};
use crate::ingest::{IngestOutcome, IngestReport, ingest_directory};
use crate::rag::build_pipeline;
use crate::server::{self, AppState};

/// Start the HTTP query service
#[inline]
pub async fn serve_chatbot(base_dir: &Path) -> Result<()> {
    let config = load_config(base_dir)?;
    info!("Starting chatbot from {}", config.base_dir.display());

    let api_key = config.llm.api_key(|key| std::env::var(key).ok());
    let pipeline = build_pipeline(&config, api_key).await;

    server::serve(&config, AppState::new(&config, pipeline)).await
}

/// Rebuild the vector index from the configured source directory
#[inline]
pub async fn ingest_documents(base_dir: &Path) -> Result<()> {
    let config = load_config(base_dir)?;
    let client = OllamaClient::new(&config.ollama)?;

    let preflight = client.clone();
    tokio::task::spawn_blocking(move || preflight.health_check())
        .await
        .context("Health check task failed")?
        .context("Ollama is not ready for embedding")?;

    let embedder: Arc<dyn Embedder> = Arc::new(client);
    let report = ingest_directory(&config, embedder).await?;
    print_report(&config, &report);
    Ok(())
}

/// Write a configuration file with default values
#[inline]
pub fn init_config(base_dir: &Path) -> Result<()> {
    let config = Config {
        base_dir: base_dir.to_path_buf(),
        ..Config::default()
    };
    let path = config.config_file_path();

    if path.exists() {
        println!("Configuration already exists at {}", path.display());
        return Ok(());
    }

    config.save().context("Failed to write configuration")?;
    println!("Wrote default configuration to {}", path.display());
    Ok(())
}

fn print_report(config: &Config, report: &IngestReport) {
    match report.outcome {
        IngestOutcome::Written { chunks } => {
            println!(
                "{} Index written to {}",
                console::style("✓").green(),
                config.index_path().display()
            );
            println!("  PDF files found: {}", report.files_found);
            println!("  Files read: {}", report.files_read);
            println!("  Files skipped: {}", report.files_skipped);
            println!("  Pages: {}", report.pages);
            println!("  Chunks: {}", chunks);
        }
        IngestOutcome::SourceMissing => {
            println!(
                "{} Source directory {} does not exist",
                console::style("✗").red(),
                config.source_path().display()
            );
        }
        IngestOutcome::NoDocuments => {
            println!(
                "{} No readable PDF documents in {}; index not modified",
                console::style("!").yellow(),
                config.source_path().display()
            );
            if report.files_skipped > 0 {
                println!("  Files skipped: {}", report.files_skipped);
            }
        }
    }
}

// Document ingestion module
// Turns a directory of PDFs into a freshly written vector index

pub mod loader;

#[cfg(test)]
mod tests;

use std::sync::Arc;

use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, error, info, warn};

use crate::config::Config;
use crate::database::{ChunkMetadata, EmbeddingRecord, VectorIndex};
use crate::embeddings::{ContentChunk, Embedder, chunk_document};
use crate::{ChatbotError, Result};

pub use loader::{PdfDocument, PdfPage, find_pdf_files, is_pdf, load_pdf};

/// How an ingestion run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestOutcome {
    /// The index was replaced with this many chunks
    Written { chunks: usize },
    /// The source directory does not exist; nothing was written
    SourceMissing,
    /// No readable document with text was found; nothing was written
    NoDocuments,
}

/// Counters collected during an ingestion run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestReport {
    pub outcome: IngestOutcome,
    pub files_found: usize,
    pub files_read: usize,
    pub files_skipped: usize,
    pub pages: usize,
    pub chunks: usize,
}

impl IngestReport {
    fn empty(outcome: IngestOutcome) -> Self {
        Self {
            outcome,
            files_found: 0,
            files_read: 0,
            files_skipped: 0,
            pages: 0,
            chunks: 0,
        }
    }

    #[inline]
    pub fn wrote_index(&self) -> bool {
        matches!(self.outcome, IngestOutcome::Written { .. })
    }
}

/// Read every PDF in the configured source directory, embed its chunks and
/// overwrite the vector index with them.
///
/// Unreadable files are skipped. Embedding and index-write failures abort the
/// run; a failure to build the ANN index afterwards is only logged.
#[inline]
pub async fn ingest_directory(config: &Config, embedder: Arc<dyn Embedder>) -> Result<IngestReport> {
    let source_dir = config.source_path();

    if !source_dir.is_dir() {
        error!(
            "Source directory {} does not exist; nothing to ingest",
            source_dir.display()
        );
        return Ok(IngestReport::empty(IngestOutcome::SourceMissing));
    }

    let files = find_pdf_files(&source_dir)?;
    info!("Found {} PDF files in {}", files.len(), source_dir.display());

    let mut report = IngestReport::empty(IngestOutcome::NoDocuments);
    report.files_found = files.len();

    let mut documents = Vec::with_capacity(files.len());
    for path in &files {
        match load_pdf(path) {
            Ok(document) if !document.pages.is_empty() => {
                report.files_read += 1;
                report.pages += document.pages.len();
                documents.push(document);
            }
            Ok(_) => {
                warn!("Skipping {}: no pages", path.display());
                report.files_skipped += 1;
            }
            Err(e) => {
                warn!("Skipping {}: {}", path.display(), e);
                report.files_skipped += 1;
            }
        }
    }

    if documents.is_empty() {
        warn!(
            "No readable PDF documents in {}; index left untouched",
            source_dir.display()
        );
        return Ok(report);
    }

    let chunks: Vec<ContentChunk> = documents
        .iter()
        .flat_map(|document| chunk_document(document, &config.chunking))
        .collect();

    if chunks.is_empty() {
        warn!(
            "Documents in {} contain no extractable text; index left untouched",
            source_dir.display()
        );
        return Ok(report);
    }

    info!(
        "Split {} pages from {} documents into {} chunks",
        report.pages,
        documents.len(),
        chunks.len()
    );

    let vectors = embed_chunks(&chunks, embedder, config.ollama.batch_size as usize).await?;
    let records = build_records(chunks, vectors);

    let index = VectorIndex::connect(&config.index_path(), &config.index.table_name).await?;
    let written = index.replace_all(&records).await?;

    if let Err(e) = index.create_vector_index().await {
        warn!("Skipping ANN index build: {}", e);
    }

    report.chunks = written;
    report.outcome = IngestOutcome::Written { chunks: written };
    info!(
        "Ingested {} chunks from {} files into {}",
        written,
        report.files_read,
        config.index_path().display()
    );
    Ok(report)
}

/// Embed chunk texts in batches on the blocking pool, ticking a progress bar
async fn embed_chunks(
    chunks: &[ContentChunk],
    embedder: Arc<dyn Embedder>,
    batch_size: usize,
) -> Result<Vec<Vec<f32>>> {
    let texts: Vec<String> = chunks.iter().map(|chunk| chunk.content.clone()).collect();
    let bar = progress_bar(texts.len() as u64);

    let task_bar = bar.clone();
    let vectors = tokio::task::spawn_blocking(move || -> anyhow::Result<Vec<Vec<f32>>> {
        let mut vectors = Vec::with_capacity(texts.len());
        for batch in texts.chunks(batch_size.max(1)) {
            vectors.extend(embedder.embed_documents(batch)?);
            task_bar.inc(batch.len() as u64);
        }
        Ok(vectors)
    })
    .await
    .map_err(|e| ChatbotError::Embedding(format!("Embedding task failed: {}", e)))?
    .map_err(|e| ChatbotError::Embedding(format!("{:#}", e)))?;

    bar.finish_and_clear();

    if vectors.len() != chunks.len() {
        return Err(ChatbotError::Embedding(format!(
            "Expected {} embeddings, got {}",
            chunks.len(),
            vectors.len()
        )));
    }

    debug!("Embedded {} chunks", vectors.len());
    Ok(vectors)
}

fn build_records(chunks: Vec<ContentChunk>, vectors: Vec<Vec<f32>>) -> Vec<EmbeddingRecord> {
    let created_at = chrono::Utc::now().to_rfc3339();

    chunks
        .into_iter()
        .zip(vectors)
        .map(|(chunk, vector)| EmbeddingRecord {
            id: uuid::Uuid::new_v4().to_string(),
            vector,
            metadata: ChunkMetadata {
                source: chunk.source,
                page: chunk.page,
                chunk_index: chunk.chunk_index as u32,
                content: chunk.content,
                created_at: created_at.clone(),
            },
        })
        .collect()
}

fn progress_bar(len: u64) -> ProgressBar {
    if console::user_attended_stderr() {
        let style = ProgressStyle::with_template("{bar:40} [{pos}/{len}] Embedding chunks")
            .unwrap_or_else(|_| ProgressStyle::default_bar());
        ProgressBar::new(len).with_style(style)
    } else {
        ProgressBar::hidden()
    }
}

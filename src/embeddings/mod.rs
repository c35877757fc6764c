// Embeddings module
// Text chunking and the embedding client used by ingestion and retrieval

pub mod chunking;
pub mod ollama;

pub use chunking::{ChunkingConfig, ContentChunk, TextSpan, chunk_document, split_text};
pub use ollama::OllamaClient;

/// Turns text into fixed-dimension vectors.
///
/// Implementations block on I/O; async callers go through `spawn_blocking`.
pub trait Embedder: Send + Sync {
    /// Embed chunk texts for storage, preserving input order
    fn embed_documents(&self, texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>>;

    /// Embed a single question for similarity search
    fn embed_query(&self, text: &str) -> anyhow::Result<Vec<f32>>;
}

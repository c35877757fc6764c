// Vector database module
// LanceDB-backed storage of chunk embeddings with similarity search

pub mod vector_store;

use serde::{Deserialize, Serialize};

pub use vector_store::{SearchResult, VectorIndex};

/// Embedding record stored in LanceDB
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingRecord {
    /// Unique identifier for this embedding
    pub id: String,
    /// The vector embedding (384 dimensions for all-minilm)
    pub vector: Vec<f32>,
    /// The chunk this embedding represents
    pub metadata: ChunkMetadata,
}

/// Chunk data stored alongside its embedding
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChunkMetadata {
    /// Path of the source PDF
    pub source: String,
    /// 1-based page the chunk starts on
    pub page: u32,
    /// Index of this chunk within its document
    pub chunk_index: u32,
    /// The actual text content of the chunk
    pub content: String,
    /// Timestamp when this embedding was created
    pub created_at: String,
}

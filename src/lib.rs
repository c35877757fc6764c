use thiserror::Error;

pub type Result<T> = std::result::Result<T, ChatbotError>;

#[derive(Error, Debug)]
pub enum ChatbotError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Vector index error: {0}")]
    Index(String),

    #[error("Embedding error: {0}")]
    Embedding(String),

    #[error("LLM error: {0}")]
    Llm(String),

    #[error("PDF error: {0}")]
    Pdf(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Other error: {0}")]
    Other(#[from] anyhow::Error),
}

pub mod commands;
pub mod config;
pub mod database;
pub mod embeddings;
pub mod ingest;
pub mod llm;
pub mod rag;
pub mod server;

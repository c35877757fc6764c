// Question answering pipelines
// Direct persona prompting, or retrieval over the vector index followed by a "stuff" prompt


use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, error, info, warn};

use crate::config::Config;
use crate::database::VectorIndex;
use crate::embeddings::{Embedder, OllamaClient};
use crate::llm::{ChatMessage, ChatModel, GroqClient};
use crate::{ChatbotError, Result};

/// System prompt preamble used when answering from retrieved context
pub const CONTEXT_PROMPT_PREFIX: &str = "Use the following pieces of context to answer the user's question.\n\
If you don't know the answer, just say that you don't know, don't try to make up an answer.\n\
----------------\n";

/// Finds the chunks most relevant to a question
#[async_trait]
pub trait Retriever: Send + Sync {
    /// Chunk texts ordered from most to least similar
    async fn retrieve(&self, question: &str) -> Result<Vec<String>>;
}

/// Retriever backed by the on-disk vector index and an embedding client
pub struct IndexRetriever {
    index: VectorIndex,
    embedder: Arc<dyn Embedder>,
    top_k: usize,
}

impl IndexRetriever {
    #[inline]
    pub fn new(index: VectorIndex, embedder: Arc<dyn Embedder>, top_k: usize) -> Self {
        Self {
            index,
            embedder,
            top_k,
        }
    }
}

#[async_trait]
impl Retriever for IndexRetriever {
    async fn retrieve(&self, question: &str) -> Result<Vec<String>> {
        let embedder = Arc::clone(&self.embedder);
        let query = question.to_string();

        let vector = tokio::task::spawn_blocking(move || embedder.embed_query(&query))
            .await
            .map_err(|e| ChatbotError::Embedding(format!("Embedding task failed: {}", e)))?
            .map_err(|e| ChatbotError::Embedding(format!("{:#}", e)))?;

        let results = self.index.search_similar(&vector, self.top_k).await?;
        debug!("Retrieved {} chunks for question", results.len());

        Ok(results
            .into_iter()
            .map(|result| result.chunk_metadata.content)
            .collect())
    }
}

/// How a question is turned into an answer
pub enum Pipeline {
    /// Ask the model directly, framed by a persona prompt
    Direct {
        model: Arc<dyn ChatModel>,
        persona_prompt: String,
    },
    /// Retrieve context from the index and let the model answer from it
    RetrievalAugmented {
        model: Arc<dyn ChatModel>,
        retriever: Arc<dyn Retriever>,
    },
}

impl Pipeline {
    #[inline]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Direct { .. } => "direct",
            Self::RetrievalAugmented { .. } => "retrieval-augmented",
        }
    }

    /// Answer a single question, returning the model's text unmodified
    #[inline]
    pub async fn answer(&self, question: &str) -> Result<String> {
        match self {
            Self::Direct {
                model,
                persona_prompt,
            } => model.complete(direct_prompt(persona_prompt, question)).await,
            Self::RetrievalAugmented { model, retriever } => {
                let context = retriever.retrieve(question).await?;
                model.complete(stuff_prompt(&context, question)).await
            }
        }
    }
}

/// Single user message: the persona framing immediately followed by the question
#[inline]
pub fn direct_prompt(persona_prompt: &str, question: &str) -> Vec<ChatMessage> {
    vec![ChatMessage::user(format!("{persona_prompt}{question}"))]
}

/// System message carrying the retrieved chunks, then the question as the user message
#[inline]
pub fn stuff_prompt(context: &[String], question: &str) -> Vec<ChatMessage> {
    let system = format!("{CONTEXT_PROMPT_PREFIX}{}", context.join("\n\n"));
    vec![ChatMessage::system(system), ChatMessage::user(question)]
}

/// Assemble the pipeline the query service runs with.
///
/// Returns `None` when no API key is available or the existing index cannot
/// be attached; the service then answers every question with its "not ready"
/// reply.
#[inline]
pub async fn build_pipeline(config: &Config, api_key: Option<String>) -> Option<Pipeline> {
    let Some(api_key) = api_key else {
        error!(
            "{} is not set; the chatbot cannot answer questions",
            config.llm.api_key_env
        );
        return None;
    };

    let model: Arc<dyn ChatModel> = match GroqClient::new(&config.llm, api_key) {
        Ok(client) => Arc::new(client),
        Err(e) => {
            error!("Failed to create LLM client: {:#}", e);
            return None;
        }
    };

    let index_path = config.index_path();
    if !index_path.exists() {
        warn!(
            "No vector index at {}; answering without document context",
            index_path.display()
        );
        return Some(Pipeline::Direct {
            model,
            persona_prompt: config.llm.persona_prompt.clone(),
        });
    }

    match attach_retriever(config).await {
        Ok(retriever) => {
            info!(
                "Loaded vector index from {} (top_k = {})",
                index_path.display(),
                config.index.top_k
            );
            Some(Pipeline::RetrievalAugmented {
                model,
                retriever: Arc::new(retriever),
            })
        }
        Err(e) => {
            error!(
                "Failed to load vector index from {}: {}",
                index_path.display(),
                e
            );
            None
        }
    }
}

async fn attach_retriever(config: &Config) -> Result<IndexRetriever> {
    let embedder = OllamaClient::new(&config.ollama)?;
    let index = VectorIndex::connect(&config.index_path(), &config.index.table_name).await?;
    Ok(IndexRetriever::new(
        index,
        Arc::new(embedder),
        config.index.top_k,
    ))
}

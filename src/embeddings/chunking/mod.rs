
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::ingest::loader::PdfDocument;

/// Represents a chunk of document text ready for embedding
#[derive(Debug, Clone, PartialEq)]
pub struct ContentChunk {
    /// The chunk text, a verbatim slice of the document
    pub content: String,
    /// Path of the source document
    pub source: String,
    /// The index of this chunk within the document
    pub chunk_index: usize,
    /// 1-based page on which the chunk starts
    pub page: u32,
}

/// Configuration for content chunking
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ChunkingConfig {
    /// Maximum chunk length in characters
    pub chunk_size: usize,
    /// Characters carried over from the end of one chunk to the start of the next
    pub chunk_overlap: usize,
}

impl Default for ChunkingConfig {
    #[inline]
    fn default() -> Self {
        Self {
            chunk_size: 1000,
            chunk_overlap: 200,
        }
    }
}

/// A chunk of text with the character offset it starts at
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextSpan {
    pub start: usize,
    pub text: String,
}

/// Split text into windows of `chunk_size` characters, each starting with the
/// last `chunk_overlap` characters of the previous one.
///
/// Every chunk except the last is exactly `chunk_size` characters long. Text
/// that is empty or only whitespace produces no chunks.
#[inline]
pub fn split_text(text: &str, config: &ChunkingConfig) -> Vec<TextSpan> {
    if text.trim().is_empty() {
        return Vec::new();
    }

    let chars: Vec<char> = text.chars().collect();
    let size = config.chunk_size.max(1);
    let step = size.saturating_sub(config.chunk_overlap).max(1);

    let mut spans = Vec::with_capacity(chars.len() / step + 1);
    let mut start = 0;
    loop {
        let end = (start + size).min(chars.len());
        spans.push(TextSpan {
            start,
            text: chars[start..end].iter().collect(),
        });

        if end == chars.len() {
            break;
        }
        start += step;
    }

    spans
}

/// Chunk a document's concatenated page text into embedding-ready pieces
#[inline]
pub fn chunk_document(document: &PdfDocument, config: &ChunkingConfig) -> Vec<ContentChunk> {
    let (text, page_starts) = concatenate_pages(document);
    let source = document.path.display().to_string();

    let chunks: Vec<ContentChunk> = split_text(&text, config)
        .into_iter()
        .enumerate()
        .map(|(chunk_index, span)| ContentChunk {
            content: span.text,
            source: source.clone(),
            chunk_index,
            page: page_at(&page_starts, span.start),
        })
        .collect();

    debug!(
        "Chunked '{}' ({} pages, {} chars) into {} chunks",
        source,
        document.pages.len(),
        text.chars().count(),
        chunks.len()
    );

    chunks
}

/// Join pages with a newline, recording the character offset each page starts at
fn concatenate_pages(document: &PdfDocument) -> (String, Vec<(usize, u32)>) {
    let mut text = String::new();
    let mut page_starts = Vec::with_capacity(document.pages.len());
    let mut offset = 0;

    for (i, page) in document.pages.iter().enumerate() {
        if i > 0 {
            text.push('\n');
            offset += 1;
        }
        page_starts.push((offset, page.number));
        text.push_str(&page.text);
        offset += page.text.chars().count();
    }

    (text, page_starts)
}

fn page_at(page_starts: &[(usize, u32)], offset: usize) -> u32 {
    page_starts
        .iter()
        .take_while(|(start, _)| *start <= offset)
        .last()
        .map_or(1, |(_, number)| *number)
}

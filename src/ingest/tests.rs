use super::*;
use crate::ingest::loader::tests::write_test_pdf;
use std::fs;
use std::sync::atomic::{AtomicUsize, Ordering};
use tempfile::TempDir;

/// Deterministic three-dimensional embedder that counts its calls
#[derive(Default)]
struct CountingEmbedder {
    calls: AtomicUsize,
}

fn fake_vector(text: &str) -> Vec<f32> {
    let len = text.chars().count() as f32;
    let vowels = text.chars().filter(|c| "aeiou".contains(*c)).count() as f32;
    vec![1.0, len / 1000.0, vowels / 100.0]
}

impl Embedder for CountingEmbedder {
    fn embed_documents(&self, texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(texts.iter().map(|t| fake_vector(t)).collect())
    }

    fn embed_query(&self, text: &str) -> anyhow::Result<Vec<f32>> {
        Ok(fake_vector(text))
    }
}

struct FailingEmbedder;

impl Embedder for FailingEmbedder {
    fn embed_documents(&self, _texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>> {
        Err(anyhow::anyhow!("Ollama returned HTTP 500"))
    }

    fn embed_query(&self, _text: &str) -> anyhow::Result<Vec<f32>> {
        Err(anyhow::anyhow!("Ollama returned HTTP 500"))
    }
}

fn config_in(temp_dir: &TempDir) -> Config {
    Config {
        base_dir: temp_dir.path().to_path_buf(),
        ..Config::default()
    }
}

fn source_dir(config: &Config) -> std::path::PathBuf {
    let dir = config.source_path();
    fs::create_dir_all(&dir).expect("Failed to create source dir");
    dir
}

#[tokio::test]
async fn missing_source_directory_writes_nothing() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let config = config_in(&temp_dir);

    let report = ingest_directory(&config, Arc::new(CountingEmbedder::default()))
        .await
        .expect("ingest completes");

    assert_eq!(report.outcome, IngestOutcome::SourceMissing);
    assert!(!report.wrote_index());
    assert!(!config.index_path().exists());
}

#[tokio::test]
async fn directory_without_pdfs_writes_nothing() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let config = config_in(&temp_dir);
    let dir = source_dir(&config);
    fs::write(dir.join("notas.txt"), "no soy un pdf").expect("write");
    fs::write(dir.join("imagen.png"), [0u8, 1, 2]).expect("write");

    let embedder = Arc::new(CountingEmbedder::default());
    let report = ingest_directory(&config, embedder.clone())
        .await
        .expect("ingest completes");

    assert_eq!(report.outcome, IngestOutcome::NoDocuments);
    assert_eq!(report.files_found, 0);
    assert_eq!(embedder.calls.load(Ordering::SeqCst), 0);
    assert!(!config.index_path().exists());
}

#[tokio::test]
async fn unreadable_pdf_is_skipped() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let config = config_in(&temp_dir);
    let dir = source_dir(&config);
    fs::write(dir.join("roto.pdf"), b"%PDF-1.4 garbage").expect("write");
    write_test_pdf(&dir.join("bueno.pdf"), &["Horario de atencion de 9 a 18"]);

    let report = ingest_directory(&config, Arc::new(CountingEmbedder::default()))
        .await
        .expect("ingest completes");

    assert_eq!(report.files_found, 2);
    assert_eq!(report.files_read, 1);
    assert_eq!(report.files_skipped, 1);
    assert_eq!(report.outcome, IngestOutcome::Written { chunks: 1 });
}

#[tokio::test]
async fn only_unreadable_pdfs_writes_nothing() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let config = config_in(&temp_dir);
    let dir = source_dir(&config);
    fs::write(dir.join("roto.pdf"), b"not a pdf at all").expect("write");

    let report = ingest_directory(&config, Arc::new(CountingEmbedder::default()))
        .await
        .expect("ingest completes");

    assert_eq!(report.outcome, IngestOutcome::NoDocuments);
    assert_eq!(report.files_skipped, 1);
    assert!(!config.index_path().exists());
}

#[tokio::test]
async fn writes_chunks_and_overwrites_on_rerun() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let mut config = config_in(&temp_dir);
    config.chunking.chunk_size = 20;
    config.chunking.chunk_overlap = 5;
    let dir = source_dir(&config);
    write_test_pdf(
        &dir.join("manual.pdf"),
        &["Primera pagina con bastante texto", "Segunda pagina"],
    );

    let first = ingest_directory(&config, Arc::new(CountingEmbedder::default()))
        .await
        .expect("first ingest completes");
    let IngestOutcome::Written { chunks } = first.outcome else {
        panic!("expected a write, got {:?}", first.outcome);
    };
    assert!(chunks > 1);
    assert_eq!(first.pages, 2);

    let second = ingest_directory(&config, Arc::new(CountingEmbedder::default()))
        .await
        .expect("second ingest completes");
    assert_eq!(second.outcome, IngestOutcome::Written { chunks });

    let index = VectorIndex::connect(&config.index_path(), &config.index.table_name)
        .await
        .expect("index opens");
    assert_eq!(
        index.count_chunks().await.expect("count succeeds"),
        chunks as u64
    );
}

#[tokio::test]
async fn embeddings_are_requested_in_batches() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let mut config = config_in(&temp_dir);
    config.chunking.chunk_size = 10;
    config.chunking.chunk_overlap = 0;
    config.ollama.batch_size = 2;
    let dir = source_dir(&config);
    write_test_pdf(&dir.join("a.pdf"), &[&"abcdefghij".repeat(5)]);

    let embedder = Arc::new(CountingEmbedder::default());
    let report = ingest_directory(&config, embedder.clone())
        .await
        .expect("ingest completes");

    // 50 characters give at least five chunks; extraction may append a newline
    assert!(report.chunks >= 5);
    assert_eq!(
        embedder.calls.load(Ordering::SeqCst),
        report.chunks.div_ceil(2)
    );
}

#[tokio::test]
async fn embedding_failure_aborts_before_write() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let config = config_in(&temp_dir);
    let dir = source_dir(&config);
    write_test_pdf(&dir.join("a.pdf"), &["contenido"]);

    let result = ingest_directory(&config, Arc::new(FailingEmbedder)).await;

    assert!(matches!(result, Err(ChatbotError::Embedding(_))));
    assert!(!config.index_path().exists());
}

#[test]
fn records_carry_chunk_metadata() {
    let chunks = vec![ContentChunk {
        content: "texto".to_string(),
        source: "documentos/a.pdf".to_string(),
        chunk_index: 3,
        page: 2,
    }];
    let records = build_records(chunks, vec![vec![0.1, 0.2]]);

    assert_eq!(records.len(), 1);
    assert_eq!(records[0].metadata.chunk_index, 3);
    assert_eq!(records[0].metadata.page, 2);
    assert_eq!(records[0].metadata.content, "texto");
    assert!(uuid::Uuid::parse_str(&records[0].id).is_ok());
}

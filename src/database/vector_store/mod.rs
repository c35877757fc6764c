
use super::{ChunkMetadata, EmbeddingRecord};
use crate::ChatbotError;
use arrow::array::{
    Array, FixedSizeListArray, Float32Array, RecordBatchIterator, StringArray, UInt32Array,
};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use futures::TryStreamExt;
use lancedb::{
    Connection,
    query::{ExecutableQuery, QueryBase},
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

/// Persistent chunk index stored as a LanceDB directory
pub struct VectorIndex {
    connection: Connection,
    table_name: String,
    path: PathBuf,
}

/// Search result from vector similarity search
#[derive(Debug, Clone)]
pub struct SearchResult {
    pub chunk_metadata: ChunkMetadata,
    pub similarity_score: f32,
    pub distance: f32,
}

impl VectorIndex {
    /// Connect to the index directory, creating it if needed
    ///
    /// Connecting does not validate the contents; a missing or malformed
    /// table surfaces on the first search.
    #[inline]
    pub async fn connect(path: &Path, table_name: &str) -> Result<Self, ChatbotError> {
        debug!("Connecting to LanceDB at path: {}", path.display());

        std::fs::create_dir_all(path).map_err(|e| {
            ChatbotError::Index(format!("Failed to create vector index directory: {}", e))
        })?;

        let uri = format!("file://{}", path.display());
        let connection = lancedb::connect(&uri)
            .execute()
            .await
            .map_err(|e| ChatbotError::Index(format!("Failed to connect to LanceDB: {}", e)))?;

        Ok(Self {
            connection,
            table_name: table_name.to_string(),
            path: path.to_path_buf(),
        })
    }

    #[inline]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Create schema with the specified vector dimension
    fn create_schema(vector_dim: usize) -> Arc<Schema> {
        Arc::new(Schema::new(vec![
            Field::new("id", DataType::Utf8, false),
            Field::new(
                "vector",
                DataType::FixedSizeList(
                    Arc::new(Field::new("item", DataType::Float32, false)),
                    vector_dim as i32,
                ),
                false,
            ),
            Field::new("source", DataType::Utf8, false),
            Field::new("page", DataType::UInt32, false),
            Field::new("chunk_index", DataType::UInt32, false),
            Field::new("content", DataType::Utf8, false),
            Field::new("created_at", DataType::Utf8, false),
        ]))
    }

    /// Replace the whole table with `records`
    ///
    /// The previous table, if any, is dropped first; nothing is merged.
    #[inline]
    pub async fn replace_all(&self, records: &[EmbeddingRecord]) -> Result<usize, ChatbotError> {
        let vector_dim = records
            .first()
            .map(|record| record.vector.len())
            .ok_or_else(|| ChatbotError::Index("No embeddings to store".to_string()))?;

        if vector_dim == 0 {
            return Err(ChatbotError::Index(
                "Embeddings have zero dimensions".to_string(),
            ));
        }

        if let Some(bad) = records.iter().find(|r| r.vector.len() != vector_dim) {
            return Err(ChatbotError::Index(format!(
                "Inconsistent vector dimensions: expected {}, got {} for {}",
                vector_dim,
                bad.vector.len(),
                bad.id
            )));
        }

        debug!(
            "Replacing table {} with {} embeddings of {} dimensions",
            self.table_name,
            records.len(),
            vector_dim
        );

        self.drop_table_if_exists().await?;

        let schema = Self::create_schema(vector_dim);
        self.connection
            .create_empty_table(&self.table_name, Arc::clone(&schema))
            .execute()
            .await
            .map_err(|e| ChatbotError::Index(format!("Failed to create table: {}", e)))?;

        let record_batch = Self::create_record_batch(schema, vector_dim, records)?;

        let table = self
            .connection
            .open_table(&self.table_name)
            .execute()
            .await
            .map_err(|e| ChatbotError::Index(format!("Failed to open table: {}", e)))?;

        let batch_schema = record_batch.schema();
        let reader = RecordBatchIterator::new(std::iter::once(Ok(record_batch)), batch_schema);
        table
            .add(reader)
            .execute()
            .await
            .map_err(|e| ChatbotError::Index(format!("Failed to insert embeddings: {}", e)))?;

        info!(
            "Stored {} embeddings in {}",
            records.len(),
            self.path.display()
        );
        Ok(records.len())
    }

    /// Create a RecordBatch from embedding records
    fn create_record_batch(
        schema: Arc<Schema>,
        vector_dim: usize,
        records: &[EmbeddingRecord],
    ) -> Result<RecordBatch, ChatbotError> {
        let len = records.len();

        let mut ids = Vec::with_capacity(len);
        let mut flat_values = Vec::with_capacity(len * vector_dim);
        let mut sources = Vec::with_capacity(len);
        let mut pages = Vec::with_capacity(len);
        let mut chunk_indices = Vec::with_capacity(len);
        let mut contents = Vec::with_capacity(len);
        let mut created_ats = Vec::with_capacity(len);

        for record in records {
            ids.push(record.id.as_str());
            flat_values.extend_from_slice(&record.vector);
            sources.push(record.metadata.source.as_str());
            pages.push(record.metadata.page);
            chunk_indices.push(record.metadata.chunk_index);
            contents.push(record.metadata.content.as_str());
            created_ats.push(record.metadata.created_at.as_str());
        }

        let values_array = Float32Array::from(flat_values);
        let field = Arc::new(Field::new("item", DataType::Float32, false));
        let vector_array =
            FixedSizeListArray::try_new(field, vector_dim as i32, Arc::new(values_array), None)
                .map_err(|e| {
                    ChatbotError::Index(format!("Failed to create vector array: {}", e))
                })?;

        let arrays: Vec<Arc<dyn Array>> = vec![
            Arc::new(StringArray::from(ids)),
            Arc::new(vector_array),
            Arc::new(StringArray::from(sources)),
            Arc::new(UInt32Array::from(pages)),
            Arc::new(UInt32Array::from(chunk_indices)),
            Arc::new(StringArray::from(contents)),
            Arc::new(StringArray::from(created_ats)),
        ];

        RecordBatch::try_new(schema, arrays)
            .map_err(|e| ChatbotError::Index(format!("Failed to create record batch: {}", e)))
    }

    /// Build an ANN index on the vector column
    ///
    /// LanceDB refuses to train an index on small tables, so callers treat a
    /// failure here as non-fatal.
    #[inline]
    pub async fn create_vector_index(&self) -> Result<(), ChatbotError> {
        debug!("Creating vector index on {}", self.table_name);

        let table = self
            .connection
            .open_table(&self.table_name)
            .execute()
            .await
            .map_err(|e| ChatbotError::Index(format!("Failed to open table: {}", e)))?;

        table
            .create_index(&["vector"], lancedb::index::Index::Auto)
            .execute()
            .await
            .map_err(|e| ChatbotError::Index(format!("Failed to create vector index: {}", e)))?;

        info!("Vector index created successfully");
        Ok(())
    }

    /// Search for the `limit` chunks nearest to `query_vector`, closest first
    #[inline]
    pub async fn search_similar(
        &self,
        query_vector: &[f32],
        limit: usize,
    ) -> Result<Vec<SearchResult>, ChatbotError> {
        debug!("Searching for similar vectors with limit: {}", limit);

        let table = self
            .connection
            .open_table(&self.table_name)
            .execute()
            .await
            .map_err(|e| ChatbotError::Index(format!("Failed to open table: {}", e)))?;

        let mut results = table
            .vector_search(query_vector)
            .map_err(|e| ChatbotError::Index(format!("Failed to create vector search: {}", e)))?
            .column("vector")
            .limit(limit)
            .execute()
            .await
            .map_err(|e| ChatbotError::Index(format!("Failed to execute search: {}", e)))?;

        let mut search_results = Vec::new();
        while let Some(batch) = results
            .try_next()
            .await
            .map_err(|e| ChatbotError::Index(format!("Failed to read result stream: {}", e)))?
        {
            search_results.extend(Self::parse_search_batch(&batch)?);
        }

        debug!("Parsed {} search results", search_results.len());
        Ok(search_results)
    }

    /// Parse a single record batch from search results
    fn parse_search_batch(batch: &RecordBatch) -> Result<Vec<SearchResult>, ChatbotError> {
        let sources = string_column(batch, "source")?;
        let contents = string_column(batch, "content")?;
        let created_ats = string_column(batch, "created_at")?;
        let pages = u32_column(batch, "page")?;
        let chunk_indices = u32_column(batch, "chunk_index")?;

        let distances = batch
            .column_by_name("_distance")
            .and_then(|col| col.as_any().downcast_ref::<Float32Array>());

        let mut search_results = Vec::with_capacity(batch.num_rows());
        for row in 0..batch.num_rows() {
            let chunk_metadata = ChunkMetadata {
                source: sources.value(row).to_string(),
                page: pages.value(row),
                chunk_index: chunk_indices.value(row),
                content: contents.value(row).to_string(),
                created_at: created_ats.value(row).to_string(),
            };

            let distance = distances.map_or(0.0, |d| if d.is_null(row) { 0.0 } else { d.value(row) });

            search_results.push(SearchResult {
                chunk_metadata,
                similarity_score: 1.0 - distance,
                distance,
            });
        }

        Ok(search_results)
    }

    /// Get the total number of chunks stored
    #[inline]
    pub async fn count_chunks(&self) -> Result<u64, ChatbotError> {
        let table = self
            .connection
            .open_table(&self.table_name)
            .execute()
            .await
            .map_err(|e| ChatbotError::Index(format!("Failed to open table: {}", e)))?;

        let count = table
            .count_rows(None)
            .await
            .map_err(|e| ChatbotError::Index(format!("Failed to count rows: {}", e)))?;

        Ok(count as u64)
    }

    /// Drop the chunks table if it exists
    async fn drop_table_if_exists(&self) -> Result<(), ChatbotError> {
        let table_names = self
            .connection
            .table_names()
            .execute()
            .await
            .map_err(|e| ChatbotError::Index(format!("Failed to list tables: {}", e)))?;

        if table_names.contains(&self.table_name) {
            info!("Dropping existing {} table", self.table_name);
            self.connection
                .drop_table(&self.table_name)
                .await
                .map_err(|e| ChatbotError::Index(format!("Failed to drop table: {}", e)))?;
        }

        Ok(())
    }
}

fn string_column<'a>(batch: &'a RecordBatch, name: &str) -> Result<&'a StringArray, ChatbotError> {
    batch
        .column_by_name(name)
        .ok_or_else(|| ChatbotError::Index(format!("Missing {} column", name)))?
        .as_any()
        .downcast_ref::<StringArray>()
        .ok_or_else(|| ChatbotError::Index(format!("Invalid {} column type", name)))
}

fn u32_column<'a>(batch: &'a RecordBatch, name: &str) -> Result<&'a UInt32Array, ChatbotError> {
    batch
        .column_by_name(name)
        .ok_or_else(|| ChatbotError::Index(format!("Missing {} column", name)))?
        .as_any()
        .downcast_ref::<UInt32Array>()
        .ok_or_else(|| ChatbotError::Index(format!("Invalid {} column type", name)))
}

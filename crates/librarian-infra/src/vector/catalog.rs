//! LanceDB-backed catalog index.
//!
//! Implements `SimilarityIndex` from `librarian-core`: every summary chunk is
//! one row of the catalog table with its metadata columns and a
//! 384-dimensional embedding. Search uses cosine distance; metadata filters
//! become an SQL predicate built only from the known filterable columns.

use std::sync::Arc;

use arrow_array::{
    Array, FixedSizeListArray, Float32Array, Int32Array, RecordBatch, RecordBatchIterator,
    StringArray,
};
use arrow_schema::{DataType, Field};
use futures_util::TryStreamExt;
use lancedb::query::{ExecutableQuery, QueryBase, Select};

use librarian_core::retrieval::SimilarityIndex;
use librarian_core::retrieval::embedder::Embedder;
use librarian_types::error::RepositoryError;
use librarian_types::retrieval::{
    BookMetadata, CatalogChunk, CatalogEntry, MetadataFilter, RetrievalHit,
};

use super::lance::LanceVectorStore;
use super::schema::{EMBEDDING_DIMENSION, catalog_schema};

const LIST_COLUMNS: [&str; 6] = ["id", "title", "genre", "themes", "lang", "chunk"];

/// Catalog index over one LanceDB table.
pub struct LanceCatalogIndex<E: Embedder> {
    store: LanceVectorStore,
    table_name: String,
    embedder: E,
}

impl<E: Embedder> LanceCatalogIndex<E> {
    pub fn new(store: LanceVectorStore, table_name: impl Into<String>, embedder: E) -> Self {
        Self {
            store,
            table_name: table_name.into(),
            embedder,
        }
    }

    async fn table(&self) -> Result<lancedb::Table, RepositoryError> {
        self.store
            .ensure_table(&self.table_name, Arc::new(catalog_schema()))
            .await
            .map_err(|e| RepositoryError::Query(format!("Failed to open catalog table: {e}")))
    }

    /// Number of indexed chunks; zero before the first ingestion.
    pub async fn count(&self) -> Result<usize, RepositoryError> {
        let exists = self
            .store
            .table_exists(&self.table_name)
            .await
            .map_err(|e| RepositoryError::Query(format!("Failed to list tables: {e}")))?;
        if !exists {
            return Ok(0);
        }
        self.table()
            .await?
            .count_rows(None)
            .await
            .map_err(|e| RepositoryError::Query(format!("Failed to count rows: {e}")))
    }

    /// Drop every indexed chunk. The table is recreated on next use.
    pub async fn reset(&self) -> Result<(), RepositoryError> {
        self.store
            .drop_table(&self.table_name)
            .await
            .map_err(|e| RepositoryError::Query(format!("Failed to drop catalog table: {e}")))?;
        tracing::info!(table = %self.table_name, "catalog index reset");
        Ok(())
    }

    fn build_record_batch(
        &self,
        chunks: &[CatalogChunk],
        embeddings: Vec<Vec<f32>>,
    ) -> Result<RecordBatch, RepositoryError> {
        if embeddings.len() != chunks.len() {
            return Err(RepositoryError::Query(format!(
                "embedder returned {} vectors for {} chunks",
                embeddings.len(),
                chunks.len()
            )));
        }
        if let Some(bad) = embeddings
            .iter()
            .find(|v| v.len() != EMBEDDING_DIMENSION as usize)
        {
            return Err(RepositoryError::Query(format!(
                "embedding has {} dimensions, expected {EMBEDDING_DIMENSION}",
                bad.len()
            )));
        }

        let ids = StringArray::from_iter_values(chunks.iter().map(|c| c.id.as_str()));
        let documents = StringArray::from_iter_values(chunks.iter().map(|c| c.document.as_str()));
        let titles = StringArray::from(
            chunks
                .iter()
                .map(|c| c.metadata.title.clone())
                .collect::<Vec<Option<String>>>(),
        );
        let genres = StringArray::from_iter_values(chunks.iter().map(|c| c.metadata.genre.as_str()));
        let themes = StringArray::from_iter_values(chunks.iter().map(|c| c.metadata.themes.as_str()));
        let langs = StringArray::from_iter_values(chunks.iter().map(|c| c.metadata.lang.as_str()));
        let chunk_numbers = Int32Array::from_iter_values(chunks.iter().map(|c| c.metadata.chunk as i32));
        let models =
            StringArray::from_iter_values(chunks.iter().map(|_| self.embedder.model_name()));

        let values = Float32Array::from(embeddings.into_iter().flatten().collect::<Vec<f32>>());
        let field = Arc::new(Field::new("item", DataType::Float32, true));
        let vectors = FixedSizeListArray::try_new(field, EMBEDDING_DIMENSION, Arc::new(values), None)
            .map_err(|e| RepositoryError::Query(format!("Failed to build vector column: {e}")))?;

        RecordBatch::try_new(
            Arc::new(catalog_schema()),
            vec![
                Arc::new(ids),
                Arc::new(documents),
                Arc::new(titles),
                Arc::new(genres),
                Arc::new(themes),
                Arc::new(langs),
                Arc::new(chunk_numbers),
                Arc::new(models),
                Arc::new(vectors),
            ],
        )
        .map_err(|e| RepositoryError::Query(format!("Failed to build record batch: {e}")))
    }
}

/// SQL predicate for a metadata filter, `None` when the filter is empty.
///
/// Keys outside the filterable set are rejected; values are quoted with
/// embedded single quotes doubled.
pub fn filter_predicate(filter: &MetadataFilter) -> Result<Option<String>, RepositoryError> {
    filter
        .validate()
        .map_err(|key| RepositoryError::Query(format!("unknown filter key: {key}")))?;
    let clauses: Vec<String> = filter
        .iter()
        .map(|(key, value)| format!("{key} = '{}'", value.replace('\'', "''")))
        .collect();
    Ok((!clauses.is_empty()).then(|| clauses.join(" AND ")))
}

fn string_column<'a>(batch: &'a RecordBatch, name: &str) -> Option<&'a StringArray> {
    batch
        .column_by_name(name)
        .and_then(|c| c.as_any().downcast_ref::<StringArray>())
}

fn optional_value(column: Option<&StringArray>, row: usize) -> Option<String> {
    column
        .filter(|c| !c.is_null(row))
        .map(|c| c.value(row).to_string())
}

fn batch_metadata(batch: &RecordBatch) -> Vec<BookMetadata> {
    let titles = string_column(batch, "title");
    let genres = string_column(batch, "genre");
    let themes = string_column(batch, "themes");
    let langs = string_column(batch, "lang");
    let chunks = batch
        .column_by_name("chunk")
        .and_then(|c| c.as_any().downcast_ref::<Int32Array>());

    (0..batch.num_rows())
        .map(|row| BookMetadata {
            title: optional_value(titles, row),
            genre: optional_value(genres, row).unwrap_or_default(),
            themes: optional_value(themes, row).unwrap_or_default(),
            lang: optional_value(langs, row).unwrap_or_default(),
            chunk: chunks.map_or(0, |c| c.value(row).max(0) as u32),
        })
        .collect()
}

impl<E: Embedder> SimilarityIndex for LanceCatalogIndex<E> {
    async fn query(
        &self,
        text: &str,
        n_results: usize,
        filter: Option<&MetadataFilter>,
    ) -> Result<Vec<RetrievalHit>, RepositoryError> {
        let predicate = filter.map(filter_predicate).transpose()?.flatten();
        if n_results == 0 {
            return Ok(vec![]);
        }

        let table = self.table().await?;
        let rows = table
            .count_rows(None)
            .await
            .map_err(|e| RepositoryError::Query(format!("Failed to count rows: {e}")))?;
        if rows == 0 {
            return Ok(vec![]);
        }

        let embedding = self
            .embedder
            .embed(&[text.to_string()])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| RepositoryError::Query("embedder returned no vector".into()))?;

        let mut search = table
            .vector_search(embedding)
            .map_err(|e| RepositoryError::Query(format!("Vector search setup failed: {e}")))?
            .distance_type(lancedb::DistanceType::Cosine)
            .limit(n_results);
        if let Some(predicate) = predicate {
            search = search.only_if(predicate);
        }

        let batches: Vec<RecordBatch> = search
            .execute()
            .await
            .map_err(|e| RepositoryError::Query(format!("Vector search failed: {e}")))?
            .try_collect()
            .await
            .map_err(|e| RepositoryError::Query(format!("Failed to collect results: {e}")))?;

        let mut hits = Vec::new();
        for batch in &batches {
            let documents = string_column(batch, "document");
            for (row, metadata) in batch_metadata(batch).into_iter().enumerate() {
                hits.push(RetrievalHit {
                    document: optional_value(documents, row).unwrap_or_default(),
                    metadata,
                });
            }
        }
        hits.truncate(n_results);
        Ok(hits)
    }

    async fn list_page(&self, offset: usize, limit: usize) -> Result<Vec<CatalogEntry>, RepositoryError> {
        let table = self.table().await?;
        let batches: Vec<RecordBatch> = table
            .query()
            .select(Select::columns(&LIST_COLUMNS[..]))
            .offset(offset)
            .limit(limit)
            .execute()
            .await
            .map_err(|e| RepositoryError::Query(format!("Failed to list catalog: {e}")))?
            .try_collect()
            .await
            .map_err(|e| RepositoryError::Query(format!("Failed to collect catalog page: {e}")))?;

        let mut entries = Vec::new();
        for batch in &batches {
            let ids = string_column(batch, "id");
            for (row, metadata) in batch_metadata(batch).into_iter().enumerate() {
                entries.push(CatalogEntry {
                    id: optional_value(ids, row).unwrap_or_default(),
                    metadata,
                });
            }
        }
        Ok(entries)
    }

    async fn add_chunks(&self, chunks: &[CatalogChunk]) -> Result<usize, RepositoryError> {
        if chunks.is_empty() {
            return Ok(0);
        }
        let documents: Vec<String> = chunks.iter().map(|c| c.document.clone()).collect();
        let embeddings = self.embedder.embed(&documents).await?;
        let batch = self.build_record_batch(chunks, embeddings)?;
        let schema = batch.schema();

        self.table()
            .await?
            .add(RecordBatchIterator::new(vec![Ok(batch)], schema))
            .execute()
            .await
            .map_err(|e| RepositoryError::Query(format!("Failed to add chunks: {e}")))?;

        tracing::debug!(count = chunks.len(), table = %self.table_name, "catalog chunks added");
        Ok(chunks.len())
    }
}

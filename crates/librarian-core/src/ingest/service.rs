//! Idempotent ingestion of a parsed catalog into the similarity index.

use std::collections::HashSet;
use std::sync::Arc;

use librarian_types::error::IngestError;
use librarian_types::retrieval::CatalogChunk;
use serde::Serialize;

use super::plan::{ChunkPlanner, ParsedCatalog};
use crate::retrieval::SimilarityIndex;
use crate::retrieval::catalog::list_all;

const ADD_BATCH_SIZE: usize = 256;

/// Outcome of one ingestion pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IngestReport {
    pub books_read: usize,
    pub books_skipped: usize,
    pub chunks_planned: usize,
    pub chunks_added: usize,
}

impl IngestReport {
    pub fn is_noop(&self) -> bool {
        self.chunks_added == 0
    }
}

/// Adds catalog chunks whose ids are not yet in the index.
pub struct IngestService<I: SimilarityIndex> {
    index: Arc<I>,
    planner: ChunkPlanner,
    list_page_size: usize,
}

impl<I: SimilarityIndex> IngestService<I> {
    pub fn new(index: Arc<I>, planner: ChunkPlanner, list_page_size: usize) -> Self {
        Self {
            index,
            planner,
            list_page_size,
        }
    }

    pub fn index(&self) -> &Arc<I> {
        &self.index
    }

    /// Plan chunks for every book and insert only the new ones.
    ///
    /// Running twice over the same catalog adds nothing the second time.
    #[tracing::instrument(skip_all, fields(books = catalog.books.len()))]
    pub async fn ingest(&self, catalog: &ParsedCatalog) -> Result<IngestReport, IngestError> {
        let planned = self.planner.plan_all(&catalog.books);
        let existing: HashSet<String> = list_all(self.index.as_ref(), self.list_page_size)
            .await?
            .into_iter()
            .map(|entry| entry.id)
            .collect();

        // Ids repeat when two books share a slug; the first one wins.
        let mut seen = HashSet::new();
        let fresh: Vec<CatalogChunk> = planned
            .iter()
            .filter(|chunk| !existing.contains(&chunk.id) && seen.insert(chunk.id.clone()))
            .cloned()
            .collect();

        let mut report = IngestReport {
            books_read: catalog.books.len(),
            books_skipped: catalog.skipped,
            chunks_planned: planned.len(),
            chunks_added: 0,
        };

        if fresh.is_empty() {
            tracing::info!(existing = existing.len(), "nothing new to ingest");
            return Ok(report);
        }

        for batch in fresh.chunks(ADD_BATCH_SIZE) {
            report.chunks_added += self.index.add_chunks(batch).await?;
        }
        tracing::info!(
            added = report.chunks_added,
            planned = report.chunks_planned,
            skipped = report.books_skipped,
            "catalog ingested"
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::plan::parse_catalog;
    use crate::testing::MemoryIndex;

    const CATALOG: &str = r#"[
        {"title": "Dune", "summary": "Spice, sand and prophecy.", "genre": "SF"},
        {"title": "Ion", "summary": "Ion vrea pământ."},
        {"summary": "orphan"}
    ]"#;

    fn service(index: Arc<MemoryIndex>) -> IngestService<MemoryIndex> {
        IngestService::new(index, ChunkPlanner::new(1200, 120).unwrap(), 1000)
    }

    #[tokio::test]
    async fn test_first_run_adds_every_chunk() {
        let index = Arc::new(MemoryIndex::default());
        let catalog = parse_catalog(CATALOG).unwrap();

        let report = service(index.clone()).ingest(&catalog).await.unwrap();

        assert_eq!(
            report,
            IngestReport {
                books_read: 2,
                books_skipped: 1,
                chunks_planned: 2,
                chunks_added: 2,
            }
        );
        let mut ids = index.entry_ids();
        ids.sort();
        assert_eq!(ids, vec!["dune::en::0", "ion::ro::0"]);
    }

    #[tokio::test]
    async fn test_second_run_is_a_noop() {
        let index = Arc::new(MemoryIndex::default());
        let catalog = parse_catalog(CATALOG).unwrap();
        let service = service(index.clone());

        service.ingest(&catalog).await.unwrap();
        let again = service.ingest(&catalog).await.unwrap();

        assert!(again.is_noop());
        assert_eq!(index.add_calls(), 1);
        assert_eq!(index.entry_ids().len(), 2);
    }

    #[tokio::test]
    async fn test_only_new_books_are_added() {
        let index = Arc::new(MemoryIndex::default());
        let service = service(index.clone());
        service.ingest(&parse_catalog(CATALOG).unwrap()).await.unwrap();

        let grown = parse_catalog(
            r#"[
                {"title": "Dune", "summary": "Spice, sand and prophecy."},
                {"title": "Emma", "summary": "Matchmaking in Highbury."}
            ]"#,
        )
        .unwrap();
        let report = service.ingest(&grown).await.unwrap();

        assert_eq!(report.chunks_added, 1);
        assert!(index.entry_ids().contains(&"emma::en::0".to_string()));
    }

    #[tokio::test]
    async fn test_duplicate_slugs_are_added_once() {
        let index = Arc::new(MemoryIndex::default());
        let catalog = parse_catalog(
            r#"[
                {"title": "Dune!", "summary": "first"},
                {"title": "Dune", "summary": "second"}
            ]"#,
        )
        .unwrap();
        let report = service(index.clone()).ingest(&catalog).await.unwrap();
        assert_eq!(report.chunks_planned, 2);
        assert_eq!(report.chunks_added, 1);
    }
}

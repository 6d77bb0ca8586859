//! SimilarityIndex trait definition.
//!
//! The catalog's vector index: ranked text search with metadata filters,
//! paged listing of everything indexed, and insertion of new chunks.
//! Implementations (e.g., LanceDB) live in librarian-infra.

use librarian_types::error::RepositoryError;
use librarian_types::retrieval::{CatalogChunk, CatalogEntry, MetadataFilter, RetrievalHit};

/// Trait for the catalog similarity index.
///
/// Uses RPITIT (native async fn in traits, Rust 2024 edition).
pub trait SimilarityIndex: Send + Sync {
    /// Up to `n_results` hits for `text`, most similar first, restricted to
    /// entries matching every pair in `filter`.
    fn query(
        &self,
        text: &str,
        n_results: usize,
        filter: Option<&MetadataFilter>,
    ) -> impl std::future::Future<Output = Result<Vec<RetrievalHit>, RepositoryError>> + Send;

    /// One page of indexed entries in a stable order. An empty page ends the listing.
    fn list_page(
        &self,
        offset: usize,
        limit: usize,
    ) -> impl std::future::Future<Output = Result<Vec<CatalogEntry>, RepositoryError>> + Send;

    /// Embed and insert chunks. Returns the number inserted.
    fn add_chunks(
        &self,
        chunks: &[CatalogChunk],
    ) -> impl std::future::Future<Output = Result<usize, RepositoryError>> + Send;
}

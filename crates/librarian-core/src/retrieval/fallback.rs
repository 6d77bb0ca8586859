//! Three-tier retrieval anchored on the conversation's current book.
//!
//! Follow-ups rarely repeat the book's title, so a plain similarity search
//! on the message drifts. The cascade tries, in order:
//!
//! 1. **Anchored-strict**: the caller's filter plus `title == anchor`.
//! 2. **Soft**: the caller's filter only, preferring hits whose metadata
//!    title or leading header line names the anchor.
//! 3. **Direct anchor**: the anchor title itself as the query text.
//!
//! Each tier runs only when every earlier tier returned nothing.

use std::fmt;

use librarian_types::error::RepositoryError;
use librarian_types::retrieval::{BookMetadata, MetadataFilter, RetrievalHit};

use super::index::SimilarityIndex;

const STRICT_MIN_CANDIDATES: usize = 8;
const SOFT_MIN_CANDIDATES: usize = 16;
const DIRECT_MIN_CANDIDATES: usize = 12;

/// Which tier produced a retrieval result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetrievalTier {
    AnchoredStrict,
    Soft,
    DirectAnchor,
}

impl RetrievalTier {
    pub fn as_str(self) -> &'static str {
        match self {
            RetrievalTier::AnchoredStrict => "anchored_strict",
            RetrievalTier::Soft => "soft",
            RetrievalTier::DirectAnchor => "direct_anchor",
        }
    }
}

impl fmt::Display for RetrievalTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ranked documents with their metadata as parallel sequences.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Retrieved {
    pub documents: Vec<String>,
    pub metadata: Vec<BookMetadata>,
    /// `None` when every tier came back empty.
    pub tier: Option<RetrievalTier>,
}

impl Retrieved {
    fn from_hits(hits: Vec<RetrievalHit>, k: usize, tier: RetrievalTier) -> Self {
        let (documents, metadata) = hits
            .into_iter()
            .take(k)
            .map(|hit| (hit.document, hit.metadata))
            .unzip();
        Self {
            documents,
            metadata,
            tier: Some(tier),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    /// Metadata titles in rank order (absent titles skipped).
    pub fn titles(&self) -> impl Iterator<Item = &str> {
        self.metadata.iter().filter_map(BookMetadata::title)
    }
}

/// Run the tier cascade and return at most `k` documents.
pub async fn retrieve_with_fallback<I: SimilarityIndex>(
    index: &I,
    query: &str,
    k: usize,
    filter: Option<&MetadataFilter>,
    anchor: Option<&str>,
) -> Result<Retrieved, RepositoryError> {
    let anchor = anchor.map(str::trim).filter(|a| !a.is_empty());

    // Tier 1
    let strict_filter = anchor.map(|title| {
        filter
            .cloned()
            .unwrap_or_default()
            .with("title", title)
    });
    let hits = index
        .query(
            query,
            (2 * k).max(STRICT_MIN_CANDIDATES),
            strict_filter.as_ref().or(filter),
        )
        .await?;
    if !hits.is_empty() {
        tracing::debug!(hits = hits.len(), "retrieval tier 1 (anchored-strict) hit");
        return Ok(Retrieved::from_hits(hits, k, RetrievalTier::AnchoredStrict));
    }

    // Tier 2
    let hits = index
        .query(query, (2 * k).max(SOFT_MIN_CANDIDATES), filter)
        .await?;
    if !hits.is_empty() {
        let hits = match anchor {
            Some(title) => prefer_anchor(hits, title),
            None => hits,
        };
        tracing::debug!(hits = hits.len(), "retrieval tier 2 (soft) hit");
        return Ok(Retrieved::from_hits(hits, k, RetrievalTier::Soft));
    }

    // Tier 3
    let Some(title) = anchor else {
        return Ok(Retrieved::default());
    };
    let hits = index
        .query(title, (2 * k).max(DIRECT_MIN_CANDIDATES), filter)
        .await?;
    if hits.is_empty() {
        tracing::debug!(anchor = title, "retrieval exhausted all tiers");
        return Ok(Retrieved::default());
    }
    tracing::debug!(hits = hits.len(), "retrieval tier 3 (direct anchor) hit");
    Ok(Retrieved::from_hits(hits, k, RetrievalTier::DirectAnchor))
}

/// Narrow to hits about `anchor` when there are any; otherwise keep all.
fn prefer_anchor(hits: Vec<RetrievalHit>, anchor: &str) -> Vec<RetrievalHit> {
    let want = anchor.to_lowercase();
    let want = want.trim();
    let (matching, rest): (Vec<_>, Vec<_>) = hits.into_iter().partition(|hit| {
        let title_matches = hit
            .metadata
            .title()
            .is_some_and(|t| t.to_lowercase() == want);
        let header = hit.document.split('\n').next().unwrap_or_default();
        title_matches || header.trim().to_lowercase().starts_with(want)
    });
    if matching.is_empty() { rest } else { matching }
}

//! Whole-catalog listing on top of [`SimilarityIndex::list_page`].

use std::collections::HashSet;

use librarian_types::error::RepositoryError;
use librarian_types::retrieval::CatalogEntry;

use super::index::SimilarityIndex;

/// Every indexed entry, fetched `page_size` at a time.
pub async fn list_all<I: SimilarityIndex>(
    index: &I,
    page_size: usize,
) -> Result<Vec<CatalogEntry>, RepositoryError> {
    let page_size = page_size.max(1);
    let mut entries = Vec::new();
    let mut offset = 0;
    loop {
        let page = index.list_page(offset, page_size).await?;
        let fetched = page.len();
        entries.extend(page);
        if fetched < page_size {
            break;
        }
        offset += fetched;
    }
    Ok(entries)
}

/// Distinct titles across the catalog, sorted case-insensitively.
pub async fn list_titles<I: SimilarityIndex>(
    index: &I,
    page_size: usize,
) -> Result<Vec<String>, RepositoryError> {
    let entries = list_all(index, page_size).await?;
    let mut seen = HashSet::new();
    let mut titles: Vec<String> = entries
        .iter()
        .filter_map(|entry| entry.metadata.title())
        .filter(|title| seen.insert(title.to_string()))
        .map(str::to_string)
        .collect();
    titles.sort_by_key(|title| title.to_lowercase());
    Ok(titles)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MemoryIndex;

    #[tokio::test]
    async fn test_list_all_walks_every_page() {
        let index = MemoryIndex::with_books(&[("Dune", 3), ("Ion", 2), ("Emma", 2)]);
        let entries = list_all(&index, 2).await.unwrap();
        assert_eq!(entries.len(), 7);
        // 7 entries at 2 per page: three full pages and one partial.
        assert_eq!(index.list_calls(), 4);
    }

    #[tokio::test]
    async fn test_list_all_empty_index() {
        let index = MemoryIndex::default();
        assert!(list_all(&index, 1000).await.unwrap().is_empty());
        assert_eq!(index.list_calls(), 1);
    }

    #[tokio::test]
    async fn test_titles_are_distinct_and_sorted_case_insensitively() {
        let index = MemoryIndex::with_books(&[("ion", 1), ("Dune", 2), ("Amintiri", 1), ("Dune", 1)]);
        let titles = list_titles(&index, 1000).await.unwrap();
        assert_eq!(titles, vec!["Amintiri", "Dune", "ion"]);
    }
}

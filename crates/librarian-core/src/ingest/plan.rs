//! Catalog parsing and chunk planning.

use librarian_types::catalog::{CatalogBook, RawCatalogItem};
use librarian_types::error::IngestError;
use librarian_types::retrieval::{BookMetadata, CatalogChunk};
use text_splitter::{ChunkConfig, TextSplitter};

use crate::text::slugify;

const ROMANIAN_LETTERS: &str = "ăâîșşțţĂÂÎȘŞȚŢ";

/// Valid books of a catalog file plus how many entries were skipped.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedCatalog {
    pub books: Vec<CatalogBook>,
    pub skipped: usize,
}

/// Parse a JSON catalog. The root must be an array; entries without a
/// title or summary are skipped with a warning.
pub fn parse_catalog(json: &str) -> Result<ParsedCatalog, IngestError> {
    let root: serde_json::Value =
        serde_json::from_str(json).map_err(|e| IngestError::Parse(e.to_string()))?;
    let serde_json::Value::Array(items) = root else {
        return Err(IngestError::InvalidRoot);
    };

    let mut parsed = ParsedCatalog::default();
    for (position, item) in items.into_iter().enumerate() {
        let book = serde_json::from_value::<RawCatalogItem>(item)
            .ok()
            .and_then(validate_item);
        match book {
            Some(book) => parsed.books.push(book),
            None => {
                tracing::warn!(position, "skipping catalog entry without title or summary");
                parsed.skipped += 1;
            }
        }
    }
    Ok(parsed)
}

/// Turn a raw entry into a book, or `None` if title or summary is missing.
pub fn validate_item(raw: RawCatalogItem) -> Option<CatalogBook> {
    let title = raw.title.map(|t| t.trim().to_string()).filter(|t| !t.is_empty())?;
    let summary = raw
        .summary
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())?;
    let lang = raw
        .lang
        .map(|l| l.trim().to_lowercase())
        .filter(|l| !l.is_empty())
        .unwrap_or_else(|| guess_lang(&summary).to_string());
    Some(CatalogBook {
        title,
        genre: raw.genre.unwrap_or_default().trim().to_lowercase(),
        themes: raw.themes.map(|t| t.joined()).unwrap_or_default(),
        lang,
        summary,
    })
}

/// `ro` when the text contains Romanian-specific letters, else `en`.
fn guess_lang(text: &str) -> &'static str {
    if text.chars().any(|c| ROMANIAN_LETTERS.contains(c)) {
        "ro"
    } else {
        "en"
    }
}

/// Splits summaries into overlapping chunks with stable ids.
pub struct ChunkPlanner {
    splitter: TextSplitter<text_splitter::Characters>,
}

impl ChunkPlanner {
    pub fn new(chunk_size: usize, overlap: usize) -> Result<Self, IngestError> {
        let config = ChunkConfig::new(chunk_size)
            .with_overlap(overlap)
            .map_err(|e| IngestError::Chunking(e.to_string()))?;
        Ok(Self {
            splitter: TextSplitter::new(config),
        })
    }

    /// Id of chunk `chunk` of a book: `slug(title)::lang::chunk`.
    pub fn chunk_id(title: &str, lang: &str, chunk: u32) -> String {
        format!("{}::{}::{}", slugify(title), lang, chunk)
    }

    /// Chunks of one book. Each document is `"{title}\n\n{chunk}"`.
    pub fn plan(&self, book: &CatalogBook) -> Vec<CatalogChunk> {
        self.splitter
            .chunks(&book.summary)
            .enumerate()
            .map(|(i, text)| {
                let chunk = i as u32;
                CatalogChunk {
                    id: Self::chunk_id(&book.title, &book.lang, chunk),
                    document: format!("{}\n\n{}", book.title, text),
                    metadata: BookMetadata {
                        title: Some(book.title.clone()),
                        genre: book.genre.clone(),
                        themes: book.themes.clone(),
                        lang: book.lang.clone(),
                        chunk,
                    },
                }
            })
            .collect()
    }

    pub fn plan_all(&self, books: &[CatalogBook]) -> Vec<CatalogChunk> {
        books.iter().flat_map(|book| self.plan(book)).collect()
    }
}

//! JSON catalog file: ingestion source and summary lookup.
//!
//! The configured path is preferred; when it is missing, the first `*.json`
//! (by name) in the same directory is used instead. Each successful load
//! refreshes the in-memory title -> summary map.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::RwLock;
use std::time::SystemTime;

use librarian_core::ingest::plan::{ParsedCatalog, parse_catalog};
use librarian_core::ingest::reconcile::CatalogSource;
use librarian_core::summary::SummaryLookup;
use librarian_core::text::normalize;
use librarian_types::error::IngestError;

pub struct FileCatalog {
    configured: PathBuf,
    summaries: RwLock<HashMap<String, String>>,
}

impl FileCatalog {
    pub fn new(configured: impl Into<PathBuf>) -> Self {
        Self {
            configured: configured.into(),
            summaries: RwLock::new(HashMap::new()),
        }
    }

    /// The file that would be read right now, if any.
    pub async fn resolve_path(&self) -> Result<Option<PathBuf>, IngestError> {
        if tokio::fs::try_exists(&self.configured)
            .await
            .map_err(|e| IngestError::Read(e.to_string()))?
        {
            return Ok(Some(self.configured.clone()));
        }

        let dir = match self.configured.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let mut entries = match tokio::fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(IngestError::Read(e.to_string())),
        };

        let mut candidates = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| IngestError::Read(e.to_string()))?
        {
            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == "json") && path.is_file() {
                candidates.push(path);
            }
        }
        candidates.sort();
        let fallback = candidates.into_iter().next();
        if let Some(path) = &fallback {
            tracing::info!(
                configured = %self.configured.display(),
                using = %path.display(),
                "catalog file missing, falling back"
            );
        }
        Ok(fallback)
    }

    async fn read(&self, path: &Path) -> Result<ParsedCatalog, IngestError> {
        let json = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| IngestError::Read(format!("{}: {e}", path.display())))?;
        parse_catalog(&json)
    }

    /// Load the catalog and refresh the summary map. A missing catalog
    /// leaves the map empty.
    pub async fn refresh(&self) -> Result<usize, IngestError> {
        match self.load().await {
            Ok(catalog) => Ok(catalog.books.len()),
            Err(IngestError::SourceMissing(path)) => {
                tracing::warn!(path = %path, "no catalog file found, summaries unavailable");
                Ok(0)
            }
            Err(e) => Err(e),
        }
    }

    fn replace_summaries(&self, catalog: &ParsedCatalog) {
        let map: HashMap<String, String> = catalog
            .books
            .iter()
            .map(|book| (normalize(&book.title), book.summary.clone()))
            .collect();
        match self.summaries.write() {
            Ok(mut guard) => *guard = map,
            Err(poisoned) => *poisoned.into_inner() = map,
        }
    }
}

impl CatalogSource for FileCatalog {
    async fn modified(&self) -> Result<Option<SystemTime>, IngestError> {
        let Some(path) = self.resolve_path().await? else {
            return Ok(None);
        };
        let metadata = tokio::fs::metadata(&path)
            .await
            .map_err(|e| IngestError::Read(e.to_string()))?;
        metadata
            .modified()
            .map(Some)
            .map_err(|e| IngestError::Read(e.to_string()))
    }

    async fn load(&self) -> Result<ParsedCatalog, IngestError> {
        let path = self
            .resolve_path()
            .await?
            .ok_or_else(|| IngestError::SourceMissing(self.configured.display().to_string()))?;
        let catalog = self.read(&path).await?;
        self.replace_summaries(&catalog);
        tracing::debug!(path = %path.display(), books = catalog.books.len(), "catalog loaded");
        Ok(catalog)
    }
}

impl SummaryLookup for FileCatalog {
    fn get_summary(&self, title: &str) -> Option<String> {
        let key = normalize(title);
        let guard = match self.summaries.read() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        guard.get(&key).cloned()
    }
}

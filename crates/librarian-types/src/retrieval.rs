//! Similarity-search types: metadata filters, hits, and catalog entries.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Metadata keys a caller may filter on.
pub const FILTERABLE_KEYS: &[&str] = &["title", "genre", "themes", "lang"];

/// Metadata stored with every indexed chunk.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookMetadata {
    pub title: Option<String>,
    #[serde(default)]
    pub genre: String,
    #[serde(default)]
    pub themes: String,
    #[serde(default)]
    pub lang: String,
    #[serde(default)]
    pub chunk: u32,
}

impl BookMetadata {
    /// The title, if present and not blank.
    pub fn title(&self) -> Option<&str> {
        self.title
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
    }
}

/// One ranked similarity-search result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievalHit {
    pub document: String,
    pub metadata: BookMetadata,
}

/// An indexed chunk id with its metadata, as returned by catalog listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub id: String,
    pub metadata: BookMetadata,
}

/// A chunk ready to be embedded and added to the index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogChunk {
    pub id: String,
    pub document: String,
    pub metadata: BookMetadata,
}

/// Equality filter over chunk metadata. All pairs must match.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MetadataFilter(BTreeMap<String, String>);

impl MetadataFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy with `key == value` added, replacing any existing constraint on `key`.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Reject keys outside [`FILTERABLE_KEYS`], returning the first offender.
    pub fn validate(&self) -> Result<(), String> {
        match self.0.keys().find(|k| !FILTERABLE_KEYS.contains(&k.as_str())) {
            Some(key) => Err(key.clone()),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_title_is_absent() {
        let meta = BookMetadata {
            title: Some("   ".to_string()),
            ..Default::default()
        };
        assert_eq!(meta.title(), None);

        let meta = BookMetadata {
            title: Some(" Dune ".to_string()),
            ..Default::default()
        };
        assert_eq!(meta.title(), Some("Dune"));
    }

    #[test]
    fn test_filter_with_replaces_existing_key() {
        let filter = MetadataFilter::new()
            .with("title", "Dune")
            .with("genre", "sf")
            .with("title", "Foundation");
        assert_eq!(filter.get("title"), Some("Foundation"));
        assert_eq!(filter.iter().count(), 2);
    }

    #[test]
    fn test_filter_validate_rejects_unknown_keys() {
        let ok = MetadataFilter::new().with("genre", "fantasy").with("lang", "ro");
        assert!(ok.validate().is_ok());

        let bad = MetadataFilter::new().with("genre", "fantasy").with("id", "x");
        assert_eq!(bad.validate(), Err("id".to_string()));
    }

    #[test]
    fn test_filter_deserializes_from_plain_object() {
        let filter: MetadataFilter = serde_json::from_str(r#"{"genre":"fantasy"}"#).unwrap();
        assert_eq!(filter.get("genre"), Some("fantasy"));
    }
}

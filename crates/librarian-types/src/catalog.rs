//! Book catalog items as they appear in the catalog source file.

use serde::{Deserialize, Serialize};

/// Themes may be written as a list or as a single comma-separated string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Themes {
    List(Vec<String>),
    Text(String),
}

impl Themes {
    /// Render as a single `", "`-joined string.
    pub fn joined(&self) -> String {
        match self {
            Themes::List(items) => items.join(", "),
            Themes::Text(text) => text.clone(),
        }
    }
}

/// One catalog entry before validation. Every field is optional so that a
/// single malformed entry can be skipped without failing the whole file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawCatalogItem {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub genre: Option<String>,
    #[serde(default)]
    pub themes: Option<Themes>,
    #[serde(default)]
    pub lang: Option<String>,
}

/// A validated catalog book.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogBook {
    pub title: String,
    pub summary: String,
    pub genre: String,
    pub themes: String,
    pub lang: String,
}

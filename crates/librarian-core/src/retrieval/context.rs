//! Prompt context formatting and book-title extraction.

use std::collections::HashSet;

use regex::Regex;

use super::fallback::Retrieved;

/// Heading used for passages whose metadata has no title.
pub const UNTITLED: &str = "(untitled)";

const QUOTED_TITLE_PATTERN: &str = r#"["“”'‘’„«»]([^"“”'‘’„«»]{2,120})["“”'‘’„«»]"#;

/// Formats retrieved passages for the generator and pulls the recommended
/// title back out of its answer.
#[derive(Debug, Clone)]
pub struct ContextAssembler {
    quoted_title: Regex,
}

impl ContextAssembler {
    pub fn new() -> Result<Self, regex::Error> {
        Ok(Self {
            quoted_title: Regex::new(QUOTED_TITLE_PATTERN)?,
        })
    }

    /// One `### [rank] title` section per passage, in retrieval order.
    pub fn assemble(&self, retrieved: &Retrieved) -> String {
        retrieved
            .documents
            .iter()
            .zip(&retrieved.metadata)
            .enumerate()
            .map(|(i, (document, metadata))| {
                let title = metadata.title().unwrap_or(UNTITLED);
                format!("### [{}] {}\n{}", i + 1, title, document)
            })
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    /// The first quoted span of the answer, else the first source title.
    pub fn extract_title<'a>(
        &self,
        answer: &str,
        source_titles: impl IntoIterator<Item = &'a str>,
    ) -> Option<String> {
        if let Some(quoted) = self
            .quoted_title
            .captures(answer)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().trim())
            .filter(|t| !t.is_empty())
        {
            return Some(quoted.to_string());
        }

        let mut seen = HashSet::new();
        source_titles
            .into_iter()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .find(|t| seen.insert(*t))
            .map(str::to_string)
    }
}

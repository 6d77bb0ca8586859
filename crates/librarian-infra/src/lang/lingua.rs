//! `LanguageOracle` backed by the lingua detector.
//!
//! Building the detector loads n-gram models for every candidate language,
//! so it happens once, either in [`LinguaOracle::warm_up`] at startup or on
//! the first detection.

use std::sync::OnceLock;

use lingua::{Language, LanguageDetector, LanguageDetectorBuilder};

use librarian_core::lang::LanguageOracle;

/// Languages a catalog reader is likely to write in. Romanian needs close
/// neighbours in the set, otherwise short Italian or Spanish text is
/// misread as Romanian.
const CANDIDATES: [Language; 7] = [
    Language::English,
    Language::Romanian,
    Language::French,
    Language::German,
    Language::Italian,
    Language::Spanish,
    Language::Portuguese,
];

#[derive(Default)]
pub struct LinguaOracle {
    detector: OnceLock<LanguageDetector>,
}

impl LinguaOracle {
    pub fn new() -> Self {
        Self::default()
    }

    fn detector(&self) -> &LanguageDetector {
        self.detector.get_or_init(|| {
            tracing::debug!(languages = CANDIDATES.len(), "building language detector");
            LanguageDetectorBuilder::from_languages(&CANDIDATES)
                .with_preloaded_language_models()
                .build()
        })
    }
}

impl LanguageOracle for LinguaOracle {
    fn warm_up(&self) {
        self.detector();
    }

    fn detect(&self, text: &str) -> Option<String> {
        self.detector()
            .detect_language_of(text)
            .map(|language| language.iso_code_639_1().to_string().to_lowercase())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detects_romanian_and_english() {
        let oracle = LinguaOracle::new();
        oracle.warm_up();
        oracle.warm_up();
        assert_eq!(
            oracle.detect("Aș vrea o carte despre prietenie și curaj").as_deref(),
            Some("ro")
        );
        assert_eq!(
            oracle.detect("I would like a book about friendship and courage").as_deref(),
            Some("en")
        );
    }

    #[test]
    fn test_detect_without_warm_up_builds_lazily() {
        let oracle = LinguaOracle::new();
        assert!(oracle.detector.get().is_none());
        let _ = oracle.detect("Hello there, how are you today?");
        assert!(oracle.detector.get().is_some());
    }
}

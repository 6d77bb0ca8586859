//! Locale detection over a pluggable language-identification oracle.

use std::sync::Arc;

use librarian_types::lang::Lang;

/// A probabilistic language identifier.
///
/// Implementations load their models in [`warm_up`](LanguageOracle::warm_up),
/// which must be idempotent; `detect` after warm-up is read-only.
pub trait LanguageOracle: Send + Sync {
    /// Load models. Repeated calls are no-ops.
    fn warm_up(&self);

    /// ISO 639-1 code of the most likely language, or `None` when undecided.
    fn detect(&self, text: &str) -> Option<String>;
}

/// Maps free text to [`Lang`]. Never fails: anything undecided is English.
#[derive(Clone)]
pub struct LanguageDetector {
    oracle: Arc<dyn LanguageOracle>,
}

impl LanguageDetector {
    pub fn new(oracle: Arc<dyn LanguageOracle>) -> Self {
        Self { oracle }
    }

    pub fn warm_up(&self) {
        self.oracle.warm_up();
    }

    pub fn detect_lang(&self, text: &str) -> Lang {
        if text.trim().is_empty() {
            return Lang::En;
        }
        match self.oracle.detect(text) {
            Some(code) => Lang::from_code(&code),
            None => {
                tracing::debug!("language undetermined, defaulting to en");
                Lang::En
            }
        }
    }
}

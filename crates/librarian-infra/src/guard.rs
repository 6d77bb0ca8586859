//! Regex-based input guard.

use regex::{Regex, RegexBuilder};

use librarian_core::guard::Guard;
use librarian_core::text::normalize;
use librarian_types::config::GuardConfig;
use librarian_types::error::GuardError;

/// Rejects empty messages, oversized messages, and messages matching any
/// configured pattern. Patterns are matched case-insensitively against both
/// the raw text and its diacritic-free form.
pub struct PatternGuard {
    max_chars: usize,
    blocked: Vec<Regex>,
}

impl PatternGuard {
    pub fn new(max_chars: usize, patterns: &[String]) -> Result<Self, regex::Error> {
        let blocked = patterns
            .iter()
            .map(|p| RegexBuilder::new(p).case_insensitive(true).build())
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { max_chars, blocked })
    }

    pub fn from_config(config: &GuardConfig) -> Result<Self, regex::Error> {
        Self::new(config.max_message_chars, &config.blocked_patterns)
    }
}

impl Guard for PatternGuard {
    fn check_allowed(&self, text: &str) -> Result<(), GuardError> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Err(GuardError::Empty);
        }
        let length = trimmed.chars().count();
        if length > self.max_chars {
            return Err(GuardError::TooLong {
                length,
                max: self.max_chars,
            });
        }
        let folded = normalize(trimmed);
        if self
            .blocked
            .iter()
            .any(|re| re.is_match(trimmed) || re.is_match(&folded))
        {
            tracing::warn!(length, "message blocked by guard pattern");
            return Err(GuardError::Blocked);
        }
        Ok(())
    }
}

//! Input guard port.

use librarian_types::error::GuardError;

/// Safety / allow-list check applied to every message before any side effect.
pub trait Guard: Send + Sync {
    fn check_allowed(&self, text: &str) -> Result<(), GuardError>;
}

//! Stored-summary lookup port.

/// Looks up the catalog summary of a book by title.
pub trait SummaryLookup: Send + Sync {
    /// The summary for `title`, or `None` if the catalog has no such book.
    fn get_summary(&self, title: &str) -> Option<String>;
}

use thiserror::Error;

use crate::llm::LlmError;

/// Errors from repository operations (used by trait definitions in librarian-core).
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database connection error")]
    Connection,

    #[error("query error: {0}")]
    Query(String),

    #[error("entity not found")]
    NotFound,

    #[error("conflict: {0}")]
    Conflict(String),
}

/// Message content refused by the input guard.
#[derive(Debug, Error)]
pub enum GuardError {
    #[error("message is empty")]
    Empty,

    #[error("message too long: {length} characters (max {max})")]
    TooLong { length: usize, max: usize },

    #[error("message matches a blocked pattern")]
    Blocked,
}

/// Errors from a catalog ingestion run.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("catalog source not found: {0}")]
    SourceMissing(String),

    #[error("catalog read error: {0}")]
    Read(String),

    #[error("catalog is not valid JSON: {0}")]
    Parse(String),

    #[error("catalog root must be an array of books")]
    InvalidRoot,

    #[error("chunking error: {0}")]
    Chunking(String),

    #[error("index error: {0}")]
    Index(#[from] RepositoryError),
}

/// Errors surfaced by the conversation orchestrator.
#[derive(Debug, Error)]
pub enum ChatError {
    #[error("message rejected: {0}")]
    Rejected(#[from] GuardError),

    #[error("storage error: {0}")]
    Storage(RepositoryError),

    #[error("similarity index error: {0}")]
    Index(RepositoryError),

    #[error("generation failed: {0}")]
    Generation(#[from] LlmError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repository_error_display() {
        let err = RepositoryError::Query("syntax error".to_string());
        assert_eq!(err.to_string(), "query error: syntax error");
    }

    #[test]
    fn test_guard_error_display() {
        let err = GuardError::TooLong {
            length: 5000,
            max: 4000,
        };
        assert_eq!(
            err.to_string(),
            "message too long: 5000 characters (max 4000)"
        );
    }

    #[test]
    fn test_chat_error_wraps_guard_error() {
        let err: ChatError = GuardError::Blocked.into();
        assert!(matches!(err, ChatError::Rejected(GuardError::Blocked)));
        assert!(err.to_string().contains("blocked pattern"));
    }
}

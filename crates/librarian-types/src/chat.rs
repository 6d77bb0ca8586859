//! Conversation, message, recommendation, and chat exchange types.
//!
//! A user owns conversations; a conversation owns an ordered message history
//! and an append-only recommendation log. The most recent recommendation is
//! the conversation's anchor book.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::llm::Message;
use crate::retrieval::MetadataFilter;

// Re-export MessageRole from llm module (it's used in both chat and llm contexts).
pub use crate::llm::MessageRole;

/// Title given to conversations created implicitly by the first message.
pub const DEFAULT_CONVERSATION_TITLE: &str = "New Chat";

/// A conversation between one user and the librarian.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conversation {
    pub id: Uuid,
    pub user_id: String,
    pub title: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A persisted message. Immutable once written; ordered by `id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredMessage {
    pub id: i64,
    pub conversation_id: Uuid,
    pub role: MessageRole,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

/// An entry in a conversation's recommendation log.
///
/// `reason` is the generated answer or stored summary the title came from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub id: i64,
    pub conversation_id: Uuid,
    pub book_title: String,
    pub reason: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A usage log record written once per handled turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UsageLogEntry {
    pub id: i64,
    pub user_id: String,
    pub action: String,
    pub meta: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
}

/// An incoming chat turn.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    /// Equality filter applied to every similarity search for this turn.
    #[serde(default, alias = "where", alias = "metadata")]
    pub filter: Option<MetadataFilter>,
    /// Prior turns supplied by the caller, placed between the system
    /// instruction and the grounded question.
    #[serde(default)]
    pub history: Vec<Message>,
}

impl ChatRequest {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            ..Default::default()
        }
    }
}

/// The librarian's answer to a non-streaming chat turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatReply {
    pub conversation_id: Uuid,
    pub answer: String,
    pub title: Option<String>,
    pub reason: Option<String>,
}

/// Events of a streaming chat turn. Every stream ends with exactly one `End`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ChatStreamEvent {
    Delta { text: String },
    Error { message: String },
    End,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chat_request_accepts_filter_aliases() {
        let req: ChatRequest =
            serde_json::from_str(r#"{"message":"hi","where":{"genre":"fantasy"}}"#).unwrap();
        assert_eq!(req.filter.unwrap().get("genre"), Some("fantasy"));

        let req: ChatRequest =
            serde_json::from_str(r#"{"message":"hi","metadata":{"lang":"ro"}}"#).unwrap();
        assert_eq!(req.filter.unwrap().get("lang"), Some("ro"));
    }

    #[test]
    fn test_chat_request_defaults() {
        let req: ChatRequest = serde_json::from_str(r#"{"message":"hi"}"#).unwrap();
        assert!(req.filter.is_none());
        assert!(req.history.is_empty());
    }

    #[test]
    fn test_chat_request_history_parses_roles() {
        let req: ChatRequest = serde_json::from_str(
            r#"{"message":"hi","history":[{"role":"user","content":"a"},{"role":"assistant","content":"b"}]}"#,
        )
        .unwrap();
        assert_eq!(req.history.len(), 2);
        assert_eq!(req.history[1].role, MessageRole::Assistant);
    }

    #[test]
    fn test_stream_event_tags() {
        let json = serde_json::to_string(&ChatStreamEvent::End).unwrap();
        assert_eq!(json, r#"{"type":"end"}"#);
    }
}

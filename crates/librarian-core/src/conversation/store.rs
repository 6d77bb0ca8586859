//! ConversationStore trait definition.
//!
//! Persistence for conversations, their message history, the recommendation
//! log, and per-turn usage records. Uses native async fn in traits (RPITIT).

use librarian_types::chat::{Conversation, MessageRole, Recommendation, StoredMessage};
use librarian_types::error::RepositoryError;
use uuid::Uuid;

/// Repository trait for conversation persistence.
///
/// Implementations live in librarian-infra (e.g., `SqliteConversationStore`).
/// Implementations serialize their own writes. Two concurrent first messages
/// from the same user may both create a conversation; the later lookups pick
/// the newest one.
pub trait ConversationStore: Send + Sync {
    /// Most recently created conversation of the user, if any.
    fn latest_conversation(
        &self,
        user_id: &str,
    ) -> impl std::future::Future<Output = Result<Option<Conversation>, RepositoryError>> + Send;

    /// The user's latest conversation, creating one titled `default_title` if none exists.
    fn get_or_create_conversation(
        &self,
        user_id: &str,
        default_title: &str,
    ) -> impl std::future::Future<Output = Result<Conversation, RepositoryError>> + Send;

    /// Append a message to a conversation.
    fn append_message(
        &self,
        conversation_id: &Uuid,
        role: MessageRole,
        content: &str,
    ) -> impl std::future::Future<Output = Result<StoredMessage, RepositoryError>> + Send;

    /// The last `limit` messages of a conversation, oldest first.
    fn list_messages(
        &self,
        conversation_id: &Uuid,
        limit: i64,
    ) -> impl std::future::Future<Output = Result<Vec<StoredMessage>, RepositoryError>> + Send;

    /// Append to the conversation's recommendation log.
    fn append_recommendation(
        &self,
        conversation_id: &Uuid,
        book_title: &str,
        reason: Option<&str>,
    ) -> impl std::future::Future<Output = Result<Recommendation, RepositoryError>> + Send;

    /// The recommendation with the greatest id for this conversation.
    fn last_recommendation(
        &self,
        conversation_id: &Uuid,
    ) -> impl std::future::Future<Output = Result<Option<Recommendation>, RepositoryError>> + Send;

    /// Record a usage log entry.
    fn append_log(
        &self,
        user_id: &str,
        action: &str,
        meta: Option<&serde_json::Value>,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;
}

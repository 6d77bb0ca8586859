//! Anchor book resolution.

use librarian_types::error::RepositoryError;
use uuid::Uuid;

use super::store::ConversationStore;

/// Title of the conversation's most recent recommendation.
///
/// Recency only: the entry with the greatest id wins regardless of content.
/// A blank stored title counts as no anchor.
pub async fn last_recommended_book<S: ConversationStore>(
    store: &S,
    conversation_id: &Uuid,
) -> Result<Option<String>, RepositoryError> {
    let last = store.last_recommendation(conversation_id).await?;
    Ok(last
        .map(|rec| rec.book_title.trim().to_string())
        .filter(|title| !title.is_empty()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MemoryStore;

    #[tokio::test]
    async fn test_no_recommendations_means_no_anchor() {
        let store = MemoryStore::default();
        let conversation = store.get_or_create_conversation("u1", "New Chat").await.unwrap();
        let anchor = last_recommended_book(&store, &conversation.id).await.unwrap();
        assert_eq!(anchor, None);
    }

    #[tokio::test]
    async fn test_greatest_id_wins() {
        let store = MemoryStore::default();
        let conversation = store.get_or_create_conversation("u1", "New Chat").await.unwrap();
        store.insert_recommendation_with_id(conversation.id, 3, "Ion");
        store.insert_recommendation_with_id(conversation.id, 7, "Dune");
        store.insert_recommendation_with_id(conversation.id, 5, "Foundation");

        let anchor = last_recommended_book(&store, &conversation.id).await.unwrap();
        assert_eq!(anchor.as_deref(), Some("Dune"));
    }

    #[tokio::test]
    async fn test_other_conversations_are_ignored() {
        let store = MemoryStore::default();
        let mine = store.get_or_create_conversation("u1", "New Chat").await.unwrap();
        let theirs = store.get_or_create_conversation("u2", "New Chat").await.unwrap();
        store.insert_recommendation_with_id(mine.id, 1, "Ion");
        store.insert_recommendation_with_id(theirs.id, 9, "Dune");

        let anchor = last_recommended_book(&store, &mine.id).await.unwrap();
        assert_eq!(anchor.as_deref(), Some("Ion"));
    }

    #[tokio::test]
    async fn test_blank_title_is_not_an_anchor() {
        let store = MemoryStore::default();
        let conversation = store.get_or_create_conversation("u1", "New Chat").await.unwrap();
        store.insert_recommendation_with_id(conversation.id, 1, "   ");

        let anchor = last_recommended_book(&store, &conversation.id).await.unwrap();
        assert_eq!(anchor, None);
    }
}

//! Conversation history endpoint.

use axum::Json;
use axum::extract::{Query, State};
use serde::Serialize;
use uuid::Uuid;

use librarian_core::conversation::ConversationStore;
use librarian_types::chat::StoredMessage;

use crate::http::error::AppError;
use crate::http::extractors::query::MessagesQuery;
use crate::http::extractors::user::UserId;
use crate::http::response::{ApiResponse, RequestClock};
use crate::state::AppState;

/// Message history of the caller's latest conversation.
#[derive(Debug, Serialize)]
pub struct ConversationHistory {
    /// `None` until the user has sent a first message.
    pub conversation_id: Option<Uuid>,
    pub messages: Vec<StoredMessage>,
}

/// GET /api/v1/conversations/current/messages?limit=N
pub async fn current_messages(
    State(state): State<AppState>,
    user: UserId,
    Query(query): Query<MessagesQuery>,
) -> Result<Json<ApiResponse<ConversationHistory>>, AppError> {
    let clock = RequestClock::start();
    let store = state.orchestrator.store();

    let history = match store.latest_conversation(user.as_str()).await? {
        Some(conversation) => ConversationHistory {
            conversation_id: Some(conversation.id),
            messages: store
                .list_messages(&conversation.id, query.effective_limit())
                .await?,
        },
        None => ConversationHistory {
            conversation_id: None,
            messages: Vec::new(),
        },
    };

    Ok(Json(
        clock
            .finish(history)
            .with_link("self", "/api/v1/conversations/current/messages"),
    ))
}

//! Chat endpoints: one-shot JSON and Server-Sent Events streaming.
//!
//! POST /api/v1/chat
//! POST /api/v1/chat/stream
//!
//! SSE framing for the streaming endpoint:
//! - unnamed `data:` events carry answer fragments in order
//! - `error` carries a failure message once the stream has started
//! - `end` with data `[DONE]` always closes the stream
//!
//! The conversation id of a streaming turn is returned in the
//! `X-Conversation-Id` response header.

use std::convert::Infallible;
use std::time::Duration;

use axum::Json;
use axum::extract::State;
use axum::http::{HeaderName, HeaderValue};
use axum::response::IntoResponse;
use axum::response::sse::{Event, KeepAlive, Sse};
use futures_util::StreamExt;
use tokio_stream::Stream;

use librarian_core::chat::ChatStream;
use librarian_types::chat::{ChatReply, ChatRequest, ChatStreamEvent};

use crate::http::error::AppError;
use crate::http::extractors::user::UserId;
use crate::http::response::{ApiResponse, RequestClock};
use crate::state::AppState;

const CONVERSATION_ID_HEADER: HeaderName = HeaderName::from_static("x-conversation-id");

/// Reject filters over keys the index does not store.
pub fn validate_request(request: &ChatRequest) -> Result<(), AppError> {
    if let Some(filter) = &request.filter {
        filter
            .validate()
            .map_err(|key| AppError::Validation(format!("unknown filter key: {key}")))?;
    }
    Ok(())
}

/// POST /api/v1/chat - Handle one turn and return the complete answer.
pub async fn chat(
    State(state): State<AppState>,
    user: UserId,
    Json(body): Json<ChatRequest>,
) -> Result<Json<ApiResponse<ChatReply>>, AppError> {
    let clock = RequestClock::start();
    validate_request(&body)?;

    let reply = state.orchestrator.chat(user.as_str(), &body).await?;

    Ok(Json(clock.finish(reply).with_link(
        "messages",
        "/api/v1/conversations/current/messages",
    )))
}

/// POST /api/v1/chat/stream - Handle one turn, streaming the answer as SSE.
///
/// Guard rejections and retrieval failures are reported as ordinary JSON
/// errors before the stream opens. Dropping the response (client
/// disconnect) drops the upstream provider stream with it.
pub async fn chat_stream(
    State(state): State<AppState>,
    user: UserId,
    Json(body): Json<ChatRequest>,
) -> Result<impl IntoResponse, AppError> {
    validate_request(&body)?;

    let ChatStream {
        conversation_id,
        events,
    } = state.orchestrator.chat_stream(user.as_str(), &body).await?;
    tracing::debug!(%conversation_id, "chat stream opened");

    let header = HeaderValue::from_str(&conversation_id.to_string())
        .map_err(|e| AppError::Internal(format!("invalid conversation id header: {e}")))?;
    let sse = Sse::new(sse_frames(events)).keep_alive(KeepAlive::new().interval(Duration::from_secs(15)));

    Ok(([(CONVERSATION_ID_HEADER, header)], sse))
}

/// Translate chat events into SSE frames, guaranteeing a final `end` frame.
fn sse_frames<S>(mut events: S) -> impl Stream<Item = Result<Event, Infallible>>
where
    S: Stream<Item = ChatStreamEvent> + Send + Unpin + 'static,
{
    async_stream::stream! {
        while let Some(event) = events.next().await {
            match event {
                ChatStreamEvent::Delta { text } => {
                    yield Ok::<_, Infallible>(Event::default().data(text));
                }
                ChatStreamEvent::Error { message } => {
                    yield Ok(Event::default().event("error").data(message));
                }
                ChatStreamEvent::End => break,
            }
        }
        yield Ok(Event::default().event("end").data("[DONE]"));
    }
}

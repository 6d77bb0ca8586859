//! Query parameter extractors for list endpoints.

use serde::Deserialize;

const DEFAULT_MESSAGE_LIMIT: i64 = 50;
const MAX_MESSAGE_LIMIT: i64 = 500;

/// Query parameters for the conversation history endpoint.
#[derive(Debug, Deserialize, Default)]
pub struct MessagesQuery {
    /// Maximum number of messages, newest kept.
    pub limit: Option<i64>,
}

impl MessagesQuery {
    /// The requested limit clamped to `1..=500`, 50 when absent.
    pub fn effective_limit(&self) -> i64 {
        self.limit
            .unwrap_or(DEFAULT_MESSAGE_LIMIT)
            .clamp(1, MAX_MESSAGE_LIMIT)
    }
}

//! SQLite conversation store implementation.
//!
//! Implements `ConversationStore` from `librarian-core` using sqlx with split
//! read/write pools: raw queries, private Row structs, RFC 3339 timestamps.

use chrono::{DateTime, Utc};
use librarian_core::conversation::ConversationStore;
use librarian_types::chat::{Conversation, MessageRole, Recommendation, StoredMessage, UsageLogEntry};
use librarian_types::error::RepositoryError;
use sqlx::Row;
use uuid::Uuid;

use super::pool::DatabasePool;

/// SQLite-backed implementation of `ConversationStore`.
#[derive(Clone)]
pub struct SqliteConversationStore {
    pool: DatabasePool,
}

impl SqliteConversationStore {
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }

    /// Usage log entries of a user, oldest first.
    pub async fn list_logs(&self, user_id: &str) -> Result<Vec<UsageLogEntry>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT id, user_id, action, meta, created_at FROM usage_logs WHERE user_id = ? ORDER BY id",
        )
        .bind(user_id)
        .fetch_all(&self.pool.reader)
        .await
        .map_err(query_error)?;

        rows.iter()
            .map(|row| {
                let meta: Option<String> = row.try_get("meta").map_err(query_error)?;
                let meta = meta
                    .map(|m| serde_json::from_str(&m))
                    .transpose()
                    .map_err(|e| RepositoryError::Query(format!("invalid log meta: {e}")))?;
                Ok(UsageLogEntry {
                    id: row.try_get("id").map_err(query_error)?,
                    user_id: row.try_get("user_id").map_err(query_error)?,
                    action: row.try_get("action").map_err(query_error)?,
                    meta,
                    created_at: parse_datetime(&row.try_get::<String, _>("created_at").map_err(query_error)?)?,
                })
            })
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Private Row types for SQLite-to-domain mapping
// ---------------------------------------------------------------------------

struct ConversationRow {
    id: String,
    user_id: String,
    title: Option<String>,
    created_at: String,
}

impl ConversationRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            user_id: row.try_get("user_id")?,
            title: row.try_get("title")?,
            created_at: row.try_get("created_at")?,
        })
    }

    fn into_conversation(self) -> Result<Conversation, RepositoryError> {
        Ok(Conversation {
            id: parse_uuid(&self.id, "conversation id")?,
            user_id: self.user_id,
            title: self.title,
            created_at: parse_datetime(&self.created_at)?,
        })
    }
}

struct MessageRow {
    id: i64,
    conversation_id: String,
    role: String,
    content: String,
    created_at: String,
}

impl MessageRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            conversation_id: row.try_get("conversation_id")?,
            role: row.try_get("role")?,
            content: row.try_get("content")?,
            created_at: row.try_get("created_at")?,
        })
    }

    fn into_message(self) -> Result<StoredMessage, RepositoryError> {
        let role: MessageRole = self
            .role
            .parse()
            .map_err(|e: String| RepositoryError::Query(e))?;
        Ok(StoredMessage {
            id: self.id,
            conversation_id: parse_uuid(&self.conversation_id, "conversation_id")?,
            role,
            content: self.content,
            created_at: parse_datetime(&self.created_at)?,
        })
    }
}

struct RecommendationRow {
    id: i64,
    conversation_id: String,
    book_title: String,
    reason: Option<String>,
    created_at: String,
}

impl RecommendationRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            conversation_id: row.try_get("conversation_id")?,
            book_title: row.try_get("book_title")?,
            reason: row.try_get("reason")?,
            created_at: row.try_get("created_at")?,
        })
    }

    fn into_recommendation(self) -> Result<Recommendation, RepositoryError> {
        Ok(Recommendation {
            id: self.id,
            conversation_id: parse_uuid(&self.conversation_id, "conversation_id")?,
            book_title: self.book_title,
            reason: self.reason,
            created_at: parse_datetime(&self.created_at)?,
        })
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn query_error(e: sqlx::Error) -> RepositoryError {
    RepositoryError::Query(e.to_string())
}

fn parse_uuid(s: &str, what: &str) -> Result<Uuid, RepositoryError> {
    Uuid::parse_str(s).map_err(|e| RepositoryError::Query(format!("invalid {what}: {e}")))
}

fn parse_datetime(s: &str) -> Result<DateTime<Utc>, RepositoryError> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| RepositoryError::Query(format!("invalid datetime: {e}")))
}

fn format_datetime(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339()
}

// ---------------------------------------------------------------------------
// ConversationStore implementation
// ---------------------------------------------------------------------------

impl ConversationStore for SqliteConversationStore {
    async fn latest_conversation(
        &self,
        user_id: &str,
    ) -> Result<Option<Conversation>, RepositoryError> {
        let row = sqlx::query(
            "SELECT * FROM conversations WHERE user_id = ? ORDER BY created_at DESC, id DESC LIMIT 1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool.reader)
        .await
        .map_err(query_error)?;

        row.map(|row| {
            ConversationRow::from_row(&row)
                .map_err(query_error)?
                .into_conversation()
        })
        .transpose()
    }

    async fn get_or_create_conversation(
        &self,
        user_id: &str,
        default_title: &str,
    ) -> Result<Conversation, RepositoryError> {
        if let Some(existing) = self.latest_conversation(user_id).await? {
            return Ok(existing);
        }

        let conversation = Conversation {
            id: Uuid::now_v7(),
            user_id: user_id.to_string(),
            title: Some(default_title.to_string()),
            created_at: Utc::now(),
        };
        sqlx::query("INSERT INTO conversations (id, user_id, title, created_at) VALUES (?, ?, ?, ?)")
            .bind(conversation.id.to_string())
            .bind(&conversation.user_id)
            .bind(&conversation.title)
            .bind(format_datetime(&conversation.created_at))
            .execute(&self.pool.writer)
            .await
            .map_err(query_error)?;

        tracing::debug!(user_id, conversation_id = %conversation.id, "conversation created");
        Ok(conversation)
    }

    async fn append_message(
        &self,
        conversation_id: &Uuid,
        role: MessageRole,
        content: &str,
    ) -> Result<StoredMessage, RepositoryError> {
        let created_at = Utc::now();
        let result = sqlx::query(
            "INSERT INTO messages (conversation_id, role, content, created_at) VALUES (?, ?, ?, ?)",
        )
        .bind(conversation_id.to_string())
        .bind(role.to_string())
        .bind(content)
        .bind(format_datetime(&created_at))
        .execute(&self.pool.writer)
        .await
        .map_err(query_error)?;

        Ok(StoredMessage {
            id: result.last_insert_rowid(),
            conversation_id: *conversation_id,
            role,
            content: content.to_string(),
            created_at,
        })
    }

    async fn list_messages(
        &self,
        conversation_id: &Uuid,
        limit: i64,
    ) -> Result<Vec<StoredMessage>, RepositoryError> {
        // Newest `limit` rows, flipped back to chronological order.
        let rows = sqlx::query(
            r#"SELECT * FROM (
                   SELECT * FROM messages WHERE conversation_id = ? ORDER BY id DESC LIMIT ?
               ) ORDER BY id ASC"#,
        )
        .bind(conversation_id.to_string())
        .bind(limit.max(0))
        .fetch_all(&self.pool.reader)
        .await
        .map_err(query_error)?;

        let mut messages = Vec::with_capacity(rows.len());
        for row in &rows {
            messages.push(MessageRow::from_row(row).map_err(query_error)?.into_message()?);
        }
        Ok(messages)
    }

    async fn append_recommendation(
        &self,
        conversation_id: &Uuid,
        book_title: &str,
        reason: Option<&str>,
    ) -> Result<Recommendation, RepositoryError> {
        let created_at = Utc::now();
        let result = sqlx::query(
            "INSERT INTO recommendations (conversation_id, book_title, reason, created_at) VALUES (?, ?, ?, ?)",
        )
        .bind(conversation_id.to_string())
        .bind(book_title)
        .bind(reason)
        .bind(format_datetime(&created_at))
        .execute(&self.pool.writer)
        .await
        .map_err(query_error)?;

        Ok(Recommendation {
            id: result.last_insert_rowid(),
            conversation_id: *conversation_id,
            book_title: book_title.to_string(),
            reason: reason.map(str::to_string),
            created_at,
        })
    }

    async fn last_recommendation(
        &self,
        conversation_id: &Uuid,
    ) -> Result<Option<Recommendation>, RepositoryError> {
        let row = sqlx::query(
            "SELECT * FROM recommendations WHERE conversation_id = ? ORDER BY id DESC LIMIT 1",
        )
        .bind(conversation_id.to_string())
        .fetch_optional(&self.pool.reader)
        .await
        .map_err(query_error)?;

        row.map(|row| {
            RecommendationRow::from_row(&row)
                .map_err(query_error)?
                .into_recommendation()
        })
        .transpose()
    }

    async fn append_log(
        &self,
        user_id: &str,
        action: &str,
        meta: Option<&serde_json::Value>,
    ) -> Result<(), RepositoryError> {
        sqlx::query("INSERT INTO usage_logs (user_id, action, meta, created_at) VALUES (?, ?, ?, ?)")
            .bind(user_id)
            .bind(action)
            .bind(meta.map(|m| m.to_string()))
            .bind(format_datetime(&Utc::now()))
            .execute(&self.pool.writer)
            .await
            .map_err(query_error)?;
        Ok(())
    }
}

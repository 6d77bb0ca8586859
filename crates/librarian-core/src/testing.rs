//! Hand-written port implementations shared by unit tests.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use chrono::Utc;
use futures_util::StreamExt;
use librarian_types::chat::{Conversation, MessageRole, Recommendation, StoredMessage};
use librarian_types::error::{GuardError, RepositoryError};
use librarian_types::llm::{
    CompletionRequest, CompletionResponse, LlmError, StopReason, StreamEvent, Usage,
};
use librarian_types::retrieval::{
    BookMetadata, CatalogChunk, CatalogEntry, MetadataFilter, RetrievalHit,
};
use uuid::Uuid;

use crate::conversation::ConversationStore;
use crate::guard::Guard;
use crate::lang::LanguageOracle;
use crate::llm::provider::{LlmProvider, ProviderStream};
use crate::retrieval::SimilarityIndex;
use crate::summary::SummaryLookup;

pub fn hit(title: &str, document: &str) -> RetrievalHit {
    RetrievalHit {
        document: document.to_string(),
        metadata: BookMetadata {
            title: Some(title.to_string()),
            ..Default::default()
        },
    }
}

// ---------------------------------------------------------------------------
// MemoryStore
// ---------------------------------------------------------------------------

#[derive(Default)]
struct StoreState {
    conversations: Vec<Conversation>,
    messages: Vec<StoredMessage>,
    recommendations: Vec<Recommendation>,
    logs: Vec<(String, String, Option<serde_json::Value>)>,
    next_id: i64,
}

impl StoreState {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }
}

#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<StoreState>,
}

impl MemoryStore {
    pub fn insert_recommendation_with_id(&self, conversation_id: Uuid, id: i64, title: &str) {
        let mut state = self.state.lock().unwrap();
        state.next_id = state.next_id.max(id);
        state.recommendations.push(Recommendation {
            id,
            conversation_id,
            book_title: title.to_string(),
            reason: None,
            created_at: Utc::now(),
        });
    }

    pub fn conversations(&self) -> Vec<Conversation> {
        self.state.lock().unwrap().conversations.clone()
    }

    pub fn messages(&self) -> Vec<StoredMessage> {
        self.state.lock().unwrap().messages.clone()
    }

    pub fn recommendations(&self) -> Vec<Recommendation> {
        self.state.lock().unwrap().recommendations.clone()
    }

    pub fn logs(&self) -> Vec<(String, String, Option<serde_json::Value>)> {
        self.state.lock().unwrap().logs.clone()
    }
}

impl ConversationStore for MemoryStore {
    async fn latest_conversation(&self, user_id: &str) -> Result<Option<Conversation>, RepositoryError> {
        let state = self.state.lock().unwrap();
        Ok(state
            .conversations
            .iter()
            .rev()
            .find(|c| c.user_id == user_id)
            .cloned())
    }

    async fn get_or_create_conversation(
        &self,
        user_id: &str,
        default_title: &str,
    ) -> Result<Conversation, RepositoryError> {
        let mut state = self.state.lock().unwrap();
        if let Some(existing) = state.conversations.iter().rev().find(|c| c.user_id == user_id) {
            return Ok(existing.clone());
        }
        let conversation = Conversation {
            id: Uuid::now_v7(),
            user_id: user_id.to_string(),
            title: Some(default_title.to_string()),
            created_at: Utc::now(),
        };
        state.conversations.push(conversation.clone());
        Ok(conversation)
    }

    async fn append_message(
        &self,
        conversation_id: &Uuid,
        role: MessageRole,
        content: &str,
    ) -> Result<StoredMessage, RepositoryError> {
        let mut state = self.state.lock().unwrap();
        let message = StoredMessage {
            id: state.next_id(),
            conversation_id: *conversation_id,
            role,
            content: content.to_string(),
            created_at: Utc::now(),
        };
        state.messages.push(message.clone());
        Ok(message)
    }

    async fn list_messages(
        &self,
        conversation_id: &Uuid,
        limit: i64,
    ) -> Result<Vec<StoredMessage>, RepositoryError> {
        let state = self.state.lock().unwrap();
        let mine: Vec<_> = state
            .messages
            .iter()
            .filter(|m| m.conversation_id == *conversation_id)
            .cloned()
            .collect();
        let skip = mine.len().saturating_sub(limit.max(0) as usize);
        Ok(mine.into_iter().skip(skip).collect())
    }

    async fn append_recommendation(
        &self,
        conversation_id: &Uuid,
        book_title: &str,
        reason: Option<&str>,
    ) -> Result<Recommendation, RepositoryError> {
        let mut state = self.state.lock().unwrap();
        let rec = Recommendation {
            id: state.next_id(),
            conversation_id: *conversation_id,
            book_title: book_title.to_string(),
            reason: reason.map(str::to_string),
            created_at: Utc::now(),
        };
        state.recommendations.push(rec.clone());
        Ok(rec)
    }

    async fn last_recommendation(
        &self,
        conversation_id: &Uuid,
    ) -> Result<Option<Recommendation>, RepositoryError> {
        let state = self.state.lock().unwrap();
        Ok(state
            .recommendations
            .iter()
            .filter(|r| r.conversation_id == *conversation_id)
            .max_by_key(|r| r.id)
            .cloned())
    }

    async fn append_log(
        &self,
        user_id: &str,
        action: &str,
        meta: Option<&serde_json::Value>,
    ) -> Result<(), RepositoryError> {
        let mut state = self.state.lock().unwrap();
        state
            .logs
            .push((user_id.to_string(), action.to_string(), meta.cloned()));
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// MemoryIndex
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct QueryCall {
    pub text: String,
    pub n_results: usize,
    pub filter: Option<MetadataFilter>,
}

/// Index whose `query` answers come from a script, one response per call
/// (empty once the script runs out), and whose listing serves `entries`.
#[derive(Default)]
pub struct MemoryIndex {
    responses: Mutex<VecDeque<Vec<RetrievalHit>>>,
    queries: Mutex<Vec<QueryCall>>,
    entries: Mutex<Vec<CatalogEntry>>,
    list_calls: AtomicUsize,
    add_calls: AtomicUsize,
}

impl MemoryIndex {
    pub fn scripted(responses: Vec<Vec<RetrievalHit>>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            ..Default::default()
        }
    }

    /// Listing entries for `(title, chunk_count)` books.
    pub fn with_books(books: &[(&str, u32)]) -> Self {
        let index = Self::default();
        {
            let mut entries = index.entries.lock().unwrap();
            for (n, (title, chunks)) in books.iter().enumerate() {
                for chunk in 0..*chunks {
                    entries.push(CatalogEntry {
                        id: format!("{n}-{title}::{chunk}"),
                        metadata: BookMetadata {
                            title: Some(title.to_string()),
                            chunk,
                            ..Default::default()
                        },
                    });
                }
            }
        }
        index
    }

    pub fn queries(&self) -> Vec<QueryCall> {
        self.queries.lock().unwrap().clone()
    }

    pub fn query_calls(&self) -> usize {
        self.queries.lock().unwrap().len()
    }

    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    pub fn add_calls(&self) -> usize {
        self.add_calls.load(Ordering::SeqCst)
    }

    pub fn entry_ids(&self) -> Vec<String> {
        self.entries.lock().unwrap().iter().map(|e| e.id.clone()).collect()
    }
}

impl SimilarityIndex for MemoryIndex {
    async fn query(
        &self,
        text: &str,
        n_results: usize,
        filter: Option<&MetadataFilter>,
    ) -> Result<Vec<RetrievalHit>, RepositoryError> {
        self.queries.lock().unwrap().push(QueryCall {
            text: text.to_string(),
            n_results,
            filter: filter.cloned(),
        });
        let mut hits = self.responses.lock().unwrap().pop_front().unwrap_or_default();
        hits.truncate(n_results);
        Ok(hits)
    }

    async fn list_page(&self, offset: usize, limit: usize) -> Result<Vec<CatalogEntry>, RepositoryError> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        let entries = self.entries.lock().unwrap();
        Ok(entries.iter().skip(offset).take(limit).cloned().collect())
    }

    async fn add_chunks(&self, chunks: &[CatalogChunk]) -> Result<usize, RepositoryError> {
        self.add_calls.fetch_add(1, Ordering::SeqCst);
        let mut entries = self.entries.lock().unwrap();
        entries.extend(chunks.iter().map(|c| CatalogEntry {
            id: c.id.clone(),
            metadata: c.metadata.clone(),
        }));
        Ok(chunks.len())
    }
}

// ---------------------------------------------------------------------------
// ScriptedProvider
// ---------------------------------------------------------------------------

/// Provider returning canned answers and recording every request.
#[derive(Default)]
pub struct ScriptedProvider {
    answers: Mutex<VecDeque<Result<String, LlmError>>>,
    stream_chunks: Vec<String>,
    stream_error: Option<String>,
    stream_stalls: bool,
    requests: Mutex<Vec<CompletionRequest>>,
}

impl ScriptedProvider {
    pub fn answering(answer: &str) -> Self {
        Self {
            answers: Mutex::new(VecDeque::from([Ok(answer.to_string())])),
            ..Default::default()
        }
    }

    pub fn failing(error: LlmError) -> Self {
        Self {
            answers: Mutex::new(VecDeque::from([Err(error)])),
            ..Default::default()
        }
    }

    pub fn streaming(chunks: &[&str], error: Option<&str>) -> Self {
        Self {
            stream_chunks: chunks.iter().map(|c| c.to_string()).collect(),
            stream_error: error.map(str::to_string),
            ..Default::default()
        }
    }

    /// Emits `chunks`, then never yields again.
    pub fn stalling(chunks: &[&str]) -> Self {
        Self {
            stream_chunks: chunks.iter().map(|c| c.to_string()).collect(),
            stream_stalls: true,
            ..Default::default()
        }
    }

    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().unwrap().clone()
    }
}

impl LlmProvider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<CompletionResponse, LlmError> {
        self.requests.lock().unwrap().push(request.clone());
        let next = self.answers.lock().unwrap().pop_front();
        let content = next.unwrap_or_else(|| Ok("no more answers".to_string()))?;
        Ok(CompletionResponse {
            id: "resp".into(),
            content,
            model: request.model.clone(),
            stop_reason: StopReason::EndTurn,
            usage: Usage {
                input_tokens: 100,
                output_tokens: 20,
            },
        })
    }

    fn stream(&self, request: CompletionRequest) -> ProviderStream {
        self.requests.lock().unwrap().push(request);
        let mut events: Vec<Result<StreamEvent, LlmError>> = vec![Ok(StreamEvent::Connected)];
        events.extend(
            self.stream_chunks
                .iter()
                .map(|text| Ok(StreamEvent::TextDelta { text: text.clone() })),
        );
        if self.stream_stalls {
            return Box::pin(
                futures_util::stream::iter(events).chain(futures_util::stream::pending()),
            );
        }
        match &self.stream_error {
            Some(message) => events.push(Err(LlmError::Stream(message.clone()))),
            None => {
                events.push(Ok(StreamEvent::Usage(Usage {
                    input_tokens: 80,
                    output_tokens: 12,
                })));
                events.push(Ok(StreamEvent::Done));
            }
        }
        Box::pin(futures_util::stream::iter(events))
    }
}

// ---------------------------------------------------------------------------
// Small collaborators
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct MapSummaries(pub HashMap<String, String>);

impl MapSummaries {
    pub fn with(title: &str, summary: &str) -> Self {
        Self(HashMap::from([(title.to_string(), summary.to_string())]))
    }
}

impl SummaryLookup for MapSummaries {
    fn get_summary(&self, title: &str) -> Option<String> {
        self.0.get(title).cloned()
    }
}

pub struct AllowAll;

impl Guard for AllowAll {
    fn check_allowed(&self, _text: &str) -> Result<(), GuardError> {
        Ok(())
    }
}

pub struct BlockEverything;

impl Guard for BlockEverything {
    fn check_allowed(&self, _text: &str) -> Result<(), GuardError> {
        Err(GuardError::Blocked)
    }
}

/// Oracle that always answers the same code.
pub struct FixedOracle(pub Option<&'static str>);

impl LanguageOracle for FixedOracle {
    fn warm_up(&self) {}

    fn detect(&self, _text: &str) -> Option<String> {
        self.0.map(str::to_string)
    }
}

//! Per-message conversation orchestration.
//!
//! Every turn runs the same prefix (guard, conversation, language, persist
//! the user message, resolve the anchor) and then exactly one branch, picked
//! by [`select_branch`] from [`BRANCH_PRECEDENCE`]: the first branch whose
//! guard holds handles the turn.

use std::pin::Pin;
use std::sync::Arc;
use std::time::Instant;

use futures_util::{Stream, StreamExt};
use librarian_types::chat::{
    ChatReply, ChatRequest, ChatStreamEvent, Conversation, DEFAULT_CONVERSATION_TITLE, MessageRole,
};
use librarian_types::config::LibrarianConfig;
use librarian_types::error::{ChatError, RepositoryError};
use librarian_types::lang::Lang;
use librarian_types::llm::{CompletionRequest, Message, StreamEvent, Usage};
use tracing::{info, warn};
use uuid::Uuid;

use crate::chat::prompt;
use crate::conversation::{ConversationStore, last_recommended_book};
use crate::guard::Guard;
use crate::intent::DomainClassifier;
use crate::lang::LanguageDetector;
use crate::llm::provider::LlmProvider;
use crate::retrieval::catalog::list_titles;
use crate::retrieval::{ContextAssembler, RetrievalTier, SimilarityIndex, retrieve_with_fallback};
use crate::summary::SummaryLookup;

/// Usage-log action of a non-streaming turn.
pub const CHAT_ACTION: &str = "chat";
/// Usage-log action of a streaming turn.
pub const CHAT_STREAM_ACTION: &str = "chat_stream";

/// Generation and retrieval knobs.
#[derive(Debug, Clone)]
pub struct ChatSettings {
    pub model: String,
    pub temperature: f64,
    pub max_tokens: u32,
    pub stream_max_tokens: u32,
    pub top_k: usize,
    pub list_page_size: usize,
}

impl ChatSettings {
    pub fn from_config(config: &LibrarianConfig) -> Self {
        Self {
            model: config.llm.model.clone(),
            temperature: config.llm.temperature,
            max_tokens: config.llm.max_tokens,
            stream_max_tokens: config.llm.stream_max_tokens,
            top_k: config.retrieval.top_k,
            list_page_size: config.retrieval.list_page_size,
        }
    }
}

impl Default for ChatSettings {
    fn default() -> Self {
        Self::from_config(&LibrarianConfig::default())
    }
}

/// The branch that handles a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Branch {
    /// List every catalog title. No generation, no recommendation.
    AllBooks,
    /// Fixed refusal for messages outside the book domain.
    OffTopic,
    /// Stored summary of the anchor book, bypassing retrieval.
    Summary,
    /// Tiered retrieval followed by grounded generation.
    Retrieval,
}

/// Branches in evaluation order. `Retrieval` always applies, so it goes last.
pub const BRANCH_PRECEDENCE: [Branch; 4] = [
    Branch::AllBooks,
    Branch::OffTopic,
    Branch::Summary,
    Branch::Retrieval,
];

impl Branch {
    pub fn as_str(self) -> &'static str {
        match self {
            Branch::AllBooks => "all_books",
            Branch::OffTopic => "off_topic",
            Branch::Summary => "summary",
            Branch::Retrieval => "retrieval",
        }
    }

    /// Guard of this branch.
    pub fn applies(self, signals: &TurnSignals) -> bool {
        match self {
            Branch::AllBooks => signals.all_books,
            Branch::OffTopic => {
                !signals.book_related && !(signals.has_anchor && signals.followup_loose)
            }
            Branch::Summary => signals.has_anchor && signals.mentions_summary,
            Branch::Retrieval => true,
        }
    }
}

/// Classifier verdicts for one message, plus whether an anchor exists.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TurnSignals {
    pub all_books: bool,
    pub book_related: bool,
    pub followup_loose: bool,
    pub mentions_summary: bool,
    pub has_anchor: bool,
}

impl TurnSignals {
    pub fn classify(classifier: &DomainClassifier, message: &str, has_anchor: bool) -> Self {
        Self {
            all_books: classifier.is_all_books_query(message),
            book_related: classifier.is_book_related(message),
            followup_loose: classifier.is_followup_loose(message),
            mentions_summary: classifier.mentions_summary(message),
            has_anchor,
        }
    }
}

/// First branch in [`BRANCH_PRECEDENCE`] whose guard holds.
pub fn select_branch(signals: &TurnSignals) -> Branch {
    BRANCH_PRECEDENCE
        .into_iter()
        .find(|branch| branch.applies(signals))
        .unwrap_or(Branch::Retrieval)
}

/// Incremental reply of a streaming turn.
pub struct ChatStream {
    pub conversation_id: Uuid,
    pub events: Pin<Box<dyn Stream<Item = ChatStreamEvent> + Send>>,
}

/// A reply that needs no generation call.
struct FixedReply {
    answer: String,
    /// `(title, reason)` to append to the recommendation log.
    recommendation: Option<(String, String)>,
    outcome: &'static str,
}

/// A grounded generation request.
struct Generation {
    messages: Vec<Message>,
    source_titles: Vec<String>,
    tier: Option<RetrievalTier>,
}

enum Plan {
    Fixed(FixedReply),
    Generate(Generation),
}

struct PreparedTurn {
    conversation: Conversation,
    lang: Lang,
    plan: Plan,
}

/// Structured usage-log metadata.
#[derive(Debug, Clone, Default)]
struct TurnLog {
    outcome: &'static str,
    lang: Lang,
    tier: Option<RetrievalTier>,
    usage: Option<Usage>,
    latency_ms: Option<u64>,
}

impl TurnLog {
    fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "branch": self.outcome,
            "lang": self.lang.code(),
            "tier": self.tier.map(RetrievalTier::as_str),
            "input_tokens": self.usage.map(|u| u.input_tokens),
            "output_tokens": self.usage.map(|u| u.output_tokens),
            "latency_ms": self.latency_ms,
        })
    }
}

/// Sequences classification, anchoring, retrieval, generation and
/// persistence for each incoming message.
///
/// Generic over the store, index and provider so librarian-core never
/// depends on librarian-infra.
pub struct ChatOrchestrator<S, I, P> {
    store: Arc<S>,
    index: Arc<I>,
    provider: P,
    summaries: Arc<dyn SummaryLookup>,
    guard: Arc<dyn Guard>,
    classifier: DomainClassifier,
    detector: LanguageDetector,
    assembler: ContextAssembler,
    settings: ChatSettings,
}

impl<S, I, P> ChatOrchestrator<S, I, P>
where
    S: ConversationStore + 'static,
    I: SimilarityIndex,
    P: LlmProvider,
{
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        store: Arc<S>,
        index: Arc<I>,
        provider: P,
        summaries: Arc<dyn SummaryLookup>,
        guard: Arc<dyn Guard>,
        classifier: DomainClassifier,
        detector: LanguageDetector,
        assembler: ContextAssembler,
        settings: ChatSettings,
    ) -> Self {
        Self {
            store,
            index,
            provider,
            summaries,
            guard,
            classifier,
            detector,
            assembler,
            settings,
        }
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    pub fn index(&self) -> &Arc<I> {
        &self.index
    }

    pub fn settings(&self) -> &ChatSettings {
        &self.settings
    }

    /// Handle one message and return the complete answer.
    #[tracing::instrument(skip_all, fields(user_id = %user_id))]
    pub async fn chat(&self, user_id: &str, request: &ChatRequest) -> Result<ChatReply, ChatError> {
        let turn = self.prepare(user_id, request).await?;
        let conversation_id = turn.conversation.id;

        match turn.plan {
            Plan::Fixed(fixed) => {
                let log = TurnLog {
                    outcome: fixed.outcome,
                    lang: turn.lang,
                    ..Default::default()
                };
                self.record_fixed(user_id, &conversation_id, &fixed, true, CHAT_ACTION, &log)
                    .await
                    .map_err(ChatError::Storage)?;
                let (title, reason) = fixed.recommendation.unzip();
                Ok(ChatReply {
                    conversation_id,
                    answer: fixed.answer,
                    title,
                    reason,
                })
            }
            Plan::Generate(generation) => {
                let request = self.completion_request(generation.messages, false);
                let started = Instant::now();
                let response = self.provider.complete(&request).await.map_err(|e| {
                    warn!(error = %e, "generation failed");
                    ChatError::Generation(e)
                })?;
                let latency_ms = started.elapsed().as_millis() as u64;
                let answer = response.content.trim().to_string();

                let title = self.assembler.extract_title(
                    &answer,
                    generation.source_titles.iter().map(String::as_str),
                );
                if let Some(title) = &title {
                    self.store
                        .append_recommendation(&conversation_id, title, Some(&answer))
                        .await
                        .map_err(ChatError::Storage)?;
                }

                let log = TurnLog {
                    outcome: Branch::Retrieval.as_str(),
                    lang: turn.lang,
                    tier: generation.tier,
                    usage: Some(response.usage),
                    latency_ms: Some(latency_ms),
                };
                record_answer(&*self.store, user_id, &conversation_id, &answer, CHAT_ACTION, &log)
                    .await
                    .map_err(ChatError::Storage)?;

                info!(
                    conversation_id = %conversation_id,
                    title = title.as_deref().unwrap_or(""),
                    latency_ms,
                    "answer generated"
                );
                Ok(ChatReply {
                    conversation_id,
                    reason: Some(answer.clone()),
                    answer,
                    title,
                })
            }
        }
    }

    /// Handle one message, streaming the answer as it is generated.
    ///
    /// Guard rejections and retrieval failures surface here as errors; once
    /// the stream is returned, failures arrive as an `Error` event. Every
    /// stream ends with `End`. The streaming path never records
    /// recommendations.
    #[tracing::instrument(skip_all, fields(user_id = %user_id))]
    pub async fn chat_stream(
        &self,
        user_id: &str,
        request: &ChatRequest,
    ) -> Result<ChatStream, ChatError> {
        let turn = self.prepare(user_id, request).await?;
        let conversation_id = turn.conversation.id;

        let events: Pin<Box<dyn Stream<Item = ChatStreamEvent> + Send>> = match turn.plan {
            Plan::Fixed(fixed) => {
                let log = TurnLog {
                    outcome: fixed.outcome,
                    lang: turn.lang,
                    ..Default::default()
                };
                self.record_fixed(user_id, &conversation_id, &fixed, false, CHAT_STREAM_ACTION, &log)
                    .await
                    .map_err(ChatError::Storage)?;
                Box::pin(futures_util::stream::iter([
                    ChatStreamEvent::Delta { text: fixed.answer },
                    ChatStreamEvent::End,
                ]))
            }
            Plan::Generate(generation) => {
                let mut upstream = self
                    .provider
                    .stream(self.completion_request(generation.messages, true));
                let store = Arc::clone(&self.store);
                let user_id = user_id.to_string();
                let lang = turn.lang;
                let tier = generation.tier;

                Box::pin(async_stream::stream! {
                    let started = Instant::now();
                    let mut answer = String::new();
                    let mut usage = None;
                    let mut failed = false;

                    while let Some(event) = upstream.next().await {
                        match event {
                            Ok(StreamEvent::TextDelta { text }) => {
                                answer.push_str(&text);
                                yield ChatStreamEvent::Delta { text };
                            }
                            Ok(StreamEvent::Usage(u)) => usage = Some(u),
                            Ok(StreamEvent::Done) => break,
                            Ok(_) => {}
                            Err(e) => {
                                warn!(error = %e, "generation stream failed");
                                yield ChatStreamEvent::Error { message: e.to_string() };
                                failed = true;
                                break;
                            }
                        }
                    }

                    if !failed {
                        let log = TurnLog {
                            outcome: Branch::Retrieval.as_str(),
                            lang,
                            tier,
                            usage,
                            latency_ms: Some(started.elapsed().as_millis() as u64),
                        };
                        let answer = answer.trim();
                        if let Err(e) = record_answer(
                            &*store,
                            &user_id,
                            &conversation_id,
                            answer,
                            CHAT_STREAM_ACTION,
                            &log,
                        )
                        .await
                        {
                            warn!(error = %e, "failed to persist streamed answer");
                            yield ChatStreamEvent::Error { message: e.to_string() };
                        }
                    }
                    yield ChatStreamEvent::End;
                })
            }
        };

        Ok(ChatStream {
            conversation_id,
            events,
        })
    }

    /// Steps shared by both variants, up to the point of generation.
    async fn prepare(&self, user_id: &str, request: &ChatRequest) -> Result<PreparedTurn, ChatError> {
        let message = request.message.as_str();
        self.guard.check_allowed(message)?;

        let conversation = self
            .store
            .get_or_create_conversation(user_id, DEFAULT_CONVERSATION_TITLE)
            .await
            .map_err(ChatError::Storage)?;
        let lang = self.detector.detect_lang(message);
        self.store
            .append_message(&conversation.id, MessageRole::User, message)
            .await
            .map_err(ChatError::Storage)?;

        let anchor = last_recommended_book(&*self.store, &conversation.id)
            .await
            .map_err(ChatError::Storage)?;
        let signals = TurnSignals::classify(&self.classifier, message, anchor.is_some());
        let branch = select_branch(&signals);
        info!(
            conversation_id = %conversation.id,
            lang = %lang,
            branch = branch.as_str(),
            anchor = anchor.as_deref().unwrap_or(""),
            "turn classified"
        );

        let plan = match branch {
            Branch::AllBooks => {
                let titles = list_titles(&*self.index, self.settings.list_page_size)
                    .await
                    .map_err(ChatError::Index)?;
                Plan::Fixed(FixedReply {
                    answer: prompt::all_titles(lang, &titles),
                    recommendation: None,
                    outcome: branch.as_str(),
                })
            }
            Branch::OffTopic => Plan::Fixed(FixedReply {
                answer: prompt::refusal(lang).to_string(),
                recommendation: None,
                outcome: branch.as_str(),
            }),
            Branch::Summary => {
                let summary = anchor
                    .as_deref()
                    .and_then(|title| self.summary_reply(title, "summary"));
                match summary {
                    Some(fixed) => Plan::Fixed(fixed),
                    None => self.plan_retrieval(request, lang, anchor.as_deref()).await?,
                }
            }
            Branch::Retrieval => self.plan_retrieval(request, lang, anchor.as_deref()).await?,
        };

        Ok(PreparedTurn {
            conversation,
            lang,
            plan,
        })
    }

    async fn plan_retrieval(
        &self,
        request: &ChatRequest,
        lang: Lang,
        anchor: Option<&str>,
    ) -> Result<Plan, ChatError> {
        let query = match anchor {
            Some(title) => format!("{title} {}", request.message),
            None => request.message.clone(),
        };
        let retrieved = retrieve_with_fallback(
            &*self.index,
            &query,
            self.settings.top_k,
            request.filter.as_ref(),
            anchor,
        )
        .await
        .map_err(ChatError::Index)?;

        if retrieved.is_empty() {
            if let Some(fixed) = anchor.and_then(|title| self.summary_reply(title, "summary_fallback")) {
                return Ok(Plan::Fixed(fixed));
            }
            return Ok(Plan::Fixed(FixedReply {
                answer: prompt::no_information(lang).to_string(),
                recommendation: None,
                outcome: "no_information",
            }));
        }

        info!(
            tier = ?retrieved.tier,
            hits = retrieved.len(),
            "context retrieved"
        );
        let context = self.assembler.assemble(&retrieved);
        Ok(Plan::Generate(Generation {
            messages: prompt::build_messages(lang, &request.history, &context, &request.message),
            source_titles: retrieved.titles().map(str::to_string).collect(),
            tier: retrieved.tier,
        }))
    }

    fn summary_reply(&self, title: &str, outcome: &'static str) -> Option<FixedReply> {
        let summary = self.summaries.get_summary(title)?;
        Some(FixedReply {
            answer: summary.clone(),
            recommendation: Some((title.to_string(), summary)),
            outcome,
        })
    }

    async fn record_fixed(
        &self,
        user_id: &str,
        conversation_id: &Uuid,
        fixed: &FixedReply,
        record_recommendation: bool,
        action: &str,
        log: &TurnLog,
    ) -> Result<(), RepositoryError> {
        if record_recommendation {
            if let Some((title, reason)) = &fixed.recommendation {
                self.store
                    .append_recommendation(conversation_id, title, Some(reason))
                    .await?;
            }
        }
        record_answer(&*self.store, user_id, conversation_id, &fixed.answer, action, log).await
    }

    fn completion_request(&self, messages: Vec<Message>, stream: bool) -> CompletionRequest {
        CompletionRequest {
            model: self.settings.model.clone(),
            messages,
            max_tokens: if stream {
                self.settings.stream_max_tokens
            } else {
                self.settings.max_tokens
            },
            temperature: Some(self.settings.temperature),
            stream,
        }
    }
}

async fn record_answer<S: ConversationStore>(
    store: &S,
    user_id: &str,
    conversation_id: &Uuid,
    answer: &str,
    action: &str,
    log: &TurnLog,
) -> Result<(), RepositoryError> {
    store
        .append_message(conversation_id, MessageRole::Assistant, answer)
        .await?;
    store.append_log(user_id, action, Some(&log.to_json())).await
}

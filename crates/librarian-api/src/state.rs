//! Application state wiring all services together.
//!
//! `LibraryState` holds what catalog maintenance needs (index, ingestion,
//! file catalog) and works without generation credentials, so `ingest` and
//! `books` run offline. `AppState` adds the conversation store and the chat
//! orchestrator, pinned to the concrete infra implementations.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;

use librarian_core::chat::{ChatOrchestrator, ChatSettings};
use librarian_core::ingest::{ChunkPlanner, IngestService};
use librarian_core::intent::DomainClassifier;
use librarian_core::lang::LanguageDetector;
use librarian_core::llm::box_provider::BoxLlmProvider;
use librarian_core::retrieval::ContextAssembler;
use librarian_infra::catalog::FileCatalog;
use librarian_infra::guard::PatternGuard;
use librarian_infra::lang::LinguaOracle;
use librarian_infra::llm::create_provider;
use librarian_infra::sqlite::conversation::SqliteConversationStore;
use librarian_infra::sqlite::pool::{DatabasePool, database_url};
use librarian_infra::vector::catalog::LanceCatalogIndex;
use librarian_infra::vector::embedder::FastEmbedEmbedder;
use librarian_infra::vector::lance::LanceVectorStore;
use librarian_types::config::LibrarianConfig;

/// Concrete type aliases for the generic services pinned to infra implementations.
pub type ConcreteIndex = LanceCatalogIndex<FastEmbedEmbedder>;

pub type ConcreteIngestService = IngestService<ConcreteIndex>;

pub type ConcreteOrchestrator =
    ChatOrchestrator<SqliteConversationStore, ConcreteIndex, BoxLlmProvider>;

/// Catalog-side services: similarity index, ingestion and the catalog file.
#[derive(Clone)]
pub struct LibraryState {
    pub config: Arc<LibrarianConfig>,
    pub data_dir: PathBuf,
    pub index: Arc<ConcreteIndex>,
    pub ingest: Arc<ConcreteIngestService>,
    pub catalog: Arc<FileCatalog>,
}

impl LibraryState {
    /// Open the vector store and load the embedding model.
    pub async fn init(config: LibrarianConfig, data_dir: PathBuf) -> anyhow::Result<Self> {
        tokio::fs::create_dir_all(&data_dir)
            .await
            .with_context(|| format!("cannot create data directory {}", data_dir.display()))?;

        let store = LanceVectorStore::new(LanceVectorStore::path_in(&data_dir))
            .await
            .context("cannot open vector store")?;

        // Model loading may download weights; keep it off the async workers.
        let models_dir = data_dir.join("models");
        let embedder = tokio::task::spawn_blocking(move || FastEmbedEmbedder::new(models_dir))
            .await
            .context("embedding model loader panicked")??;

        let index = Arc::new(LanceCatalogIndex::new(
            store,
            config.catalog.table.clone(),
            embedder,
        ));
        let planner = ChunkPlanner::new(config.catalog.chunk_size, config.catalog.chunk_overlap)?;
        let ingest = Arc::new(IngestService::new(
            Arc::clone(&index),
            planner,
            config.retrieval.list_page_size,
        ));
        let catalog = Arc::new(FileCatalog::new(&config.catalog.path));

        Ok(Self {
            config: Arc::new(config),
            data_dir,
            index,
            ingest,
            catalog,
        })
    }
}

/// Shared application state used by the chat CLI and the REST API.
#[derive(Clone)]
pub struct AppState {
    pub library: LibraryState,
    pub orchestrator: Arc<ConcreteOrchestrator>,
}

impl AppState {
    /// Connect to the database, build the provider and wire the orchestrator.
    ///
    /// Fails when the generation API key is not configured.
    pub async fn init(library: LibraryState) -> anyhow::Result<Self> {
        let config = Arc::clone(&library.config);

        let db_pool = DatabasePool::new(&database_url(&library.data_dir))
            .await
            .context("cannot open conversation database")?;
        let store = Arc::new(SqliteConversationStore::new(db_pool));

        let provider = create_provider(&config.llm, &config.retry).with_context(|| {
            format!(
                "generation provider unavailable; set {}",
                config.llm.api_key_env
            )
        })?;

        let guard = PatternGuard::from_config(&config.guard).context("invalid blocked pattern")?;
        let detector = LanguageDetector::new(Arc::new(LinguaOracle::new()));
        detector.warm_up();

        // Fill the summary map before the first turn needs it.
        match library.catalog.refresh().await {
            Ok(count) => tracing::debug!(summaries = count, "summary map loaded"),
            Err(e) => tracing::warn!(error = %e, "summary map unavailable"),
        }

        let orchestrator = ChatOrchestrator::new(
            store,
            Arc::clone(&library.index),
            provider,
            library.catalog.clone(),
            Arc::new(guard),
            DomainClassifier::bilingual()?,
            detector,
            ContextAssembler::new()?,
            ChatSettings::from_config(&config),
        );

        Ok(Self {
            library,
            orchestrator: Arc::new(orchestrator),
        })
    }
}

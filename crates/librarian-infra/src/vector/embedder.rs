//! FastEmbed-based local embedding generator.
//!
//! Implements the `Embedder` trait from `librarian-core` using fastembed's
//! BGESmallENV15 model (384 dimensions) with ONNX runtime inference.
//! `TextEmbedding::embed` needs `&mut self`, so the model sits behind a
//! mutex and runs on the blocking pool.

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use fastembed::{EmbeddingModel, InitOptions, TextEmbedding};
use librarian_core::retrieval::embedder::Embedder;
use librarian_types::error::RepositoryError;

use super::schema::EMBEDDING_DIMENSION;

const MODEL_NAME: &str = "BAAI/bge-small-en-v1.5";
const BATCH_SIZE: usize = 64;

/// Local embedder backed by fastembed.
#[derive(Clone)]
pub struct FastEmbedEmbedder {
    model: Arc<Mutex<TextEmbedding>>,
}

impl FastEmbedEmbedder {
    /// Load the model, downloading it into `cache_dir` on first use.
    pub fn new(cache_dir: PathBuf) -> Result<Self, RepositoryError> {
        let options = InitOptions::new(EmbeddingModel::BGESmallENV15)
            .with_cache_dir(cache_dir)
            .with_show_download_progress(false);
        let model = TextEmbedding::try_new(options)
            .map_err(|e| RepositoryError::Query(format!("Failed to load embedding model: {e}")))?;
        tracing::info!(model = MODEL_NAME, "embedding model loaded");
        Ok(Self {
            model: Arc::new(Mutex::new(model)),
        })
    }
}

impl Embedder for FastEmbedEmbedder {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, RepositoryError> {
        if texts.is_empty() {
            return Ok(vec![]);
        }
        let model = Arc::clone(&self.model);
        let texts = texts.to_vec();
        tokio::task::spawn_blocking(move || {
            let mut model = model
                .lock()
                .map_err(|_| RepositoryError::Query("embedding model lock poisoned".into()))?;
            model
                .embed(texts, Some(BATCH_SIZE))
                .map_err(|e| RepositoryError::Query(format!("Embedding failed: {e}")))
        })
        .await
        .map_err(|e| RepositoryError::Query(format!("Embedding task failed: {e}")))?
    }

    fn model_name(&self) -> &str {
        MODEL_NAME
    }

    fn dimension(&self) -> usize {
        EMBEDDING_DIMENSION as usize
    }
}

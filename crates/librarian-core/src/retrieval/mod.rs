//! Similarity retrieval: index port, tiered fallback, context assembly.

pub mod catalog;
pub mod context;
pub mod embedder;
pub mod fallback;
pub mod index;

pub use context::ContextAssembler;
pub use fallback::{RetrievalTier, Retrieved, retrieve_with_fallback};
pub use index::SimilarityIndex;

//! Infrastructure layer for the Smart Librarian.
//!
//! Contains implementations of the ports defined in `librarian-core`:
//! SQLite conversation storage, the LanceDB catalog index with fastembed
//! embeddings, the OpenAI-compatible generation provider, the lingua
//! language oracle, the JSON catalog file, and the regex input guard.

pub mod catalog;
pub mod config;
pub mod guard;
pub mod lang;
pub mod llm;
pub mod sqlite;
pub mod vector;

//! Business logic and port traits for the Smart Librarian.
//!
//! This crate defines the "ports" (store, index, provider, guard, language
//! oracle) that the infrastructure layer implements, and the chat pipeline
//! built on top of them. It depends only on `librarian-types` -- never on
//! `librarian-infra` or any database/IO crate.

pub mod chat;
pub mod conversation;
pub mod guard;
pub mod ingest;
pub mod intent;
pub mod lang;
pub mod llm;
pub mod retrieval;
pub mod summary;
pub mod text;

#[cfg(test)]
pub(crate) mod testing;

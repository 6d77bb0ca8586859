//! Shared domain types for Smart Librarian.
//!
//! This crate contains the domain types used across the librarian:
//! conversations, recommendations, retrieval hits, catalog items, LLM
//! request/response shapes, configuration, and their error types.
//!
//! Zero infrastructure dependencies -- only serde, uuid, chrono, thiserror.

pub mod catalog;
pub mod chat;
pub mod config;
pub mod error;
pub mod lang;
pub mod llm;
pub mod retrieval;

//! HTTP/REST API layer for the Smart Librarian.
//!
//! Axum-based REST API at `/api/v1/` with caller identity from the
//! upstream gateway, envelope response format, SSE streaming and CORS.

pub mod error;
pub mod extractors;
pub mod handlers;
pub mod response;
pub mod router;

//! HTTP request handlers for the REST API.

pub mod books;
pub mod chat;
pub mod conversations;

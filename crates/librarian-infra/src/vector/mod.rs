//! Vector database infrastructure for the book catalog.
//!
//! Provides LanceDB connection management, the catalog table index and
//! fastembed-based local embedding generation. Arrow schemas define the
//! table structure.

pub mod catalog;
pub mod embedder;
pub mod lance;
pub mod schema;

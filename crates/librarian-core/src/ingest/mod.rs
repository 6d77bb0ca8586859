//! Catalog ingestion: parse, chunk, deduplicate by id, index.

pub mod plan;
pub mod reconcile;
pub mod service;

pub use plan::{ChunkPlanner, ParsedCatalog, parse_catalog};
pub use reconcile::{CatalogSource, CatalogWatcher, run_reconcile_loop};
pub use service::{IngestReport, IngestService};

//! Arrow schema for the catalog table in LanceDB.
//!
//! Arrow versions MUST match lancedb's transitive dependency (57.3 for lancedb 0.26).

use std::sync::Arc;

use arrow_schema::{DataType, Field, Schema};

/// BGESmallENV15 embedding dimension.
pub const EMBEDDING_DIMENSION: i32 = 384;

/// Schema for the book catalog table.
///
/// One row per summary chunk. `title` is nullable so that rows written by
/// other tools without a title still load; everything else is required.
pub fn catalog_schema() -> Schema {
    Schema::new(vec![
        Field::new("id", DataType::Utf8, false),
        Field::new("document", DataType::Utf8, false),
        Field::new("title", DataType::Utf8, true),
        Field::new("genre", DataType::Utf8, false),
        Field::new("themes", DataType::Utf8, false),
        Field::new("lang", DataType::Utf8, false),
        Field::new("chunk", DataType::Int32, false),
        Field::new("embedding_model", DataType::Utf8, false),
        Field::new(
            "vector",
            DataType::FixedSizeList(
                Arc::new(Field::new("item", DataType::Float32, true)),
                EMBEDDING_DIMENSION,
            ),
            false,
        ),
    ])
}

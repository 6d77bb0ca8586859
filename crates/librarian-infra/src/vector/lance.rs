//! LanceDB connection for the catalog tables.
//!
//! `LanceVectorStore` owns one `lancedb::Connection` rooted at
//! `<data_dir>/vector_store` and handles table lifecycle; row-level work
//! lives in [`LanceCatalogIndex`](super::catalog::LanceCatalogIndex).

use std::path::{Path, PathBuf};
use std::sync::Arc;

use arrow_schema::Schema;

#[derive(Clone)]
pub struct LanceVectorStore {
    db: lancedb::Connection,
}

impl LanceVectorStore {
    /// Connect to the store at `dir`, creating the directory if needed.
    pub async fn new(dir: PathBuf) -> Result<Self, lancedb::Error> {
        std::fs::create_dir_all(&dir).map_err(|e| lancedb::Error::CreateDir {
            path: dir.display().to_string(),
            source: e,
        })?;
        let uri = dir.to_str().ok_or_else(|| lancedb::Error::InvalidInput {
            message: format!("vector store path is not UTF-8: {}", dir.display()),
        })?;

        let db = lancedb::connect(uri).execute().await?;
        tracing::debug!(path = %dir.display(), "vector store connected");
        Ok(Self { db })
    }

    /// Vector store directory inside a data dir.
    pub fn path_in(data_dir: &Path) -> PathBuf {
        data_dir.join("vector_store")
    }

    /// Open `name`, creating it empty with `schema` on first use.
    pub async fn ensure_table(
        &self,
        name: &str,
        schema: Arc<Schema>,
    ) -> Result<lancedb::Table, lancedb::Error> {
        match self.db.open_table(name).execute().await {
            Ok(table) => Ok(table),
            Err(lancedb::Error::TableNotFound { .. }) => {
                tracing::info!(table = name, "creating catalog table");
                self.db.create_empty_table(name, schema).execute().await
            }
            Err(e) => Err(e),
        }
    }

    pub async fn table_exists(&self, name: &str) -> Result<bool, lancedb::Error> {
        Ok(self.db.table_names().execute().await?.iter().any(|t| t == name))
    }

    /// Drop `name`. Dropping a missing table succeeds.
    pub async fn drop_table(&self, name: &str) -> Result<(), lancedb::Error> {
        match self.db.drop_table(name, &[]).await {
            Ok(()) | Err(lancedb::Error::TableNotFound { .. }) => Ok(()),
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vector::schema::catalog_schema;

    #[tokio::test]
    async fn test_ensure_table_creates_then_reopens() {
        let dir = tempfile::tempdir().unwrap();
        let store = LanceVectorStore::new(dir.path().join("vs")).await.unwrap();
        assert!(!store.table_exists("books").await.unwrap());

        let schema = Arc::new(catalog_schema());
        let table = store.ensure_table("books", schema.clone()).await.unwrap();
        assert_eq!(table.count_rows(None).await.unwrap(), 0);

        store.ensure_table("books", schema).await.unwrap();
        assert!(store.table_exists("books").await.unwrap());
    }

    #[tokio::test]
    async fn test_drop_table_twice_is_fine() {
        let dir = tempfile::tempdir().unwrap();
        let store = LanceVectorStore::new(dir.path().to_path_buf()).await.unwrap();

        store
            .ensure_table("books", Arc::new(catalog_schema()))
            .await
            .unwrap();
        store.drop_table("books").await.unwrap();
        assert!(!store.table_exists("books").await.unwrap());
        store.drop_table("books").await.unwrap();
    }

    #[test]
    fn test_path_in_data_dir() {
        assert_eq!(
            LanceVectorStore::path_in(Path::new("/data")),
            PathBuf::from("/data/vector_store")
        );
    }
}

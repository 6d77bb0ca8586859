//! Periodic re-ingestion when the catalog source changes.

use std::sync::Arc;
use std::time::{Duration, SystemTime};

use librarian_types::error::IngestError;
use tokio_util::sync::CancellationToken;

use super::plan::ParsedCatalog;
use super::service::{IngestReport, IngestService};
use crate::retrieval::SimilarityIndex;

/// Where the catalog comes from.
pub trait CatalogSource: Send + Sync {
    /// Last modification time, `None` when the source is absent.
    fn modified(
        &self,
    ) -> impl std::future::Future<Output = Result<Option<SystemTime>, IngestError>> + Send;

    fn load(&self) -> impl std::future::Future<Output = Result<ParsedCatalog, IngestError>> + Send;
}

/// Remembers the last seen modification time of a source.
#[derive(Debug, Default)]
pub struct CatalogWatcher {
    last_seen: Option<SystemTime>,
}

impl CatalogWatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Re-ingest if the source changed since the last successful pass.
    /// Returns `None` when nothing changed.
    pub async fn reconcile_once<S, I>(
        &mut self,
        source: &S,
        service: &IngestService<I>,
    ) -> Result<Option<IngestReport>, IngestError>
    where
        S: CatalogSource,
        I: SimilarityIndex,
    {
        let Some(modified) = source.modified().await? else {
            tracing::debug!("catalog source missing, skipping reconcile");
            return Ok(None);
        };
        if self.last_seen == Some(modified) {
            return Ok(None);
        }
        let catalog = source.load().await?;
        let report = service.ingest(&catalog).await?;
        self.last_seen = Some(modified);
        Ok(Some(report))
    }
}

/// Reconcile every `interval` until `cancel` fires. Failures are logged and
/// the loop keeps going.
pub async fn run_reconcile_loop<S, I>(
    source: Arc<S>,
    service: Arc<IngestService<I>>,
    interval: Duration,
    cancel: CancellationToken,
) where
    S: CatalogSource,
    I: SimilarityIndex,
{
    let mut watcher = CatalogWatcher::new();
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("catalog reconcile stopped");
                break;
            }
            _ = ticker.tick() => {
                match watcher.reconcile_once(source.as_ref(), service.as_ref()).await {
                    Ok(Some(report)) => tracing::info!(
                        added = report.chunks_added,
                        planned = report.chunks_planned,
                        "catalog reconciled"
                    ),
                    Ok(None) => tracing::debug!("catalog unchanged"),
                    Err(e) => tracing::error!(error = %e, "catalog reconcile failed"),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::ingest::plan::{ChunkPlanner, parse_catalog};
    use crate::testing::MemoryIndex;

    struct FakeSource {
        modified: Mutex<Option<SystemTime>>,
        json: Mutex<String>,
        loads: AtomicUsize,
    }

    impl FakeSource {
        fn new(json: &str) -> Self {
            Self {
                modified: Mutex::new(Some(SystemTime::UNIX_EPOCH)),
                json: Mutex::new(json.to_string()),
                loads: AtomicUsize::new(0),
            }
        }

        fn touch(&self, json: &str) {
            let mut modified = self.modified.lock().unwrap();
            *modified = modified.map(|t| t + Duration::from_secs(1));
            *self.json.lock().unwrap() = json.to_string();
        }
    }

    impl CatalogSource for FakeSource {
        async fn modified(&self) -> Result<Option<SystemTime>, IngestError> {
            Ok(*self.modified.lock().unwrap())
        }

        async fn load(&self) -> Result<ParsedCatalog, IngestError> {
            self.loads.fetch_add(1, Ordering::SeqCst);
            parse_catalog(&self.json.lock().unwrap())
        }
    }

    fn service(index: Arc<MemoryIndex>) -> IngestService<MemoryIndex> {
        IngestService::new(index, ChunkPlanner::new(1200, 120).unwrap(), 1000)
    }

    #[tokio::test]
    async fn test_unchanged_source_is_not_reloaded() {
        let source = FakeSource::new(r#"[{"title":"Dune","summary":"Sand."}]"#);
        let index = Arc::new(MemoryIndex::default());
        let service = service(index.clone());
        let mut watcher = CatalogWatcher::new();

        let first = watcher.reconcile_once(&source, &service).await.unwrap();
        assert_eq!(first.unwrap().chunks_added, 1);

        let second = watcher.reconcile_once(&source, &service).await.unwrap();
        assert!(second.is_none());
        assert_eq!(source.loads.load(Ordering::SeqCst), 1);

        source.touch(r#"[{"title":"Dune","summary":"Sand."},{"title":"Emma","summary":"Highbury."}]"#);
        let third = watcher.reconcile_once(&source, &service).await.unwrap();
        assert_eq!(third.unwrap().chunks_added, 1);
        assert_eq!(index.entry_ids().len(), 2);
    }

    #[tokio::test]
    async fn test_failed_load_is_retried_next_time() {
        let source = FakeSource::new("{}");
        let index = Arc::new(MemoryIndex::default());
        let service = service(index);
        let mut watcher = CatalogWatcher::new();

        assert!(watcher.reconcile_once(&source, &service).await.is_err());
        assert!(watcher.reconcile_once(&source, &service).await.is_err());
        assert_eq!(source.loads.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_missing_source_is_skipped() {
        let source = FakeSource::new("[]");
        *source.modified.lock().unwrap() = None;
        let index = Arc::new(MemoryIndex::default());
        let mut watcher = CatalogWatcher::new();

        let outcome = watcher.reconcile_once(&source, &service(index)).await.unwrap();
        assert!(outcome.is_none());
        assert_eq!(source.loads.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_loop_stops_on_cancel() {
        let source = Arc::new(FakeSource::new(r#"[{"title":"Dune","summary":"Sand."}]"#));
        let index = Arc::new(MemoryIndex::default());
        let service = Arc::new(service(index.clone()));
        let cancel = CancellationToken::new();

        let handle = tokio::spawn(run_reconcile_loop(
            source.clone(),
            service,
            Duration::from_secs(600),
            cancel.clone(),
        ));

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(index.entry_ids().len(), 1);

        cancel.cancel();
        handle.await.unwrap();
    }
}

//! REST API server command with background catalog reconciliation.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use console::style;
use tokio_util::sync::CancellationToken;

use librarian_core::ingest::{CatalogWatcher, run_reconcile_loop};

use crate::http;
use crate::state::AppState;

/// Bind, serve until Ctrl+C or SIGTERM, then stop the reconcile task.
///
/// Unless `no_reconcile` is set, the catalog is ingested by the reconcile
/// task's first tick and re-ingested whenever the file changes. With
/// `no_reconcile` a single ingestion runs before the listener opens.
pub async fn serve(state: AppState, no_reconcile: bool, json: bool) -> Result<()> {
    let config = Arc::clone(&state.library.config);
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let cancel = CancellationToken::new();

    let reconcile = if no_reconcile {
        let library = &state.library;
        match CatalogWatcher::new()
            .reconcile_once(library.catalog.as_ref(), library.ingest.as_ref())
            .await
        {
            Ok(Some(report)) => tracing::info!(added = report.chunks_added, "catalog ingested"),
            Ok(None) => tracing::warn!(path = %config.catalog.path, "catalog not found, index left as is"),
            Err(e) => tracing::error!(error = %e, "startup ingestion failed"),
        }
        None
    } else {
        Some(tokio::spawn(run_reconcile_loop(
            Arc::clone(&state.library.catalog),
            Arc::clone(&state.library.ingest),
            Duration::from_secs(config.catalog.reconcile_interval_secs.max(1)),
            cancel.child_token(),
        )))
    };

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("cannot bind {addr}"))?;
    tracing::info!(%addr, "listening");

    if json {
        println!("{}", serde_json::json!({ "listening": format!("http://{addr}") }));
    } else {
        println!();
        println!(
            "  {} Smart Librarian listening on {}",
            style("⚡").bold(),
            style(format!("http://{addr}")).cyan()
        );
        println!("  {}", style("Press Ctrl+C to stop").dim());
    }

    let router = http::router::build_router(state);
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal(cancel.clone()))
        .await?;

    cancel.cancel();
    if let Some(handle) = reconcile {
        if let Err(e) = handle.await {
            tracing::warn!(error = %e, "reconcile task ended abnormally");
        }
    }

    if !json {
        println!("\n  Server stopped.");
    }
    Ok(())
}

/// Wait for Ctrl+C, SIGTERM or cancellation, then cancel `cancel`.
async fn shutdown_signal(cancel: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "cannot listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "cannot listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
        _ = cancel.cancelled() => {},
    }
    tracing::info!("shutting down");
    cancel.cancel();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_shutdown_signal_returns_on_cancel() {
        let cancel = CancellationToken::new();
        let child = cancel.child_token();
        cancel.cancel();
        tokio::time::timeout(Duration::from_secs(1), shutdown_signal(cancel))
            .await
            .unwrap();
        assert!(child.is_cancelled());
    }
}

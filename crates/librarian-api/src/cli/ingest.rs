//! Catalog ingestion command.

use anyhow::{Context, Result};
use comfy_table::{Cell, Color, ContentArrangement, Table, presets};
use console::style;

use librarian_core::ingest::{CatalogSource, IngestReport};

use crate::state::LibraryState;

/// Load the catalog file and add any new chunks to the index.
///
/// Running it twice over an unchanged catalog adds nothing. With `rebuild`
/// the index is emptied first so every chunk is embedded again.
pub async fn ingest(library: &LibraryState, rebuild: bool, json: bool) -> Result<IngestReport> {
    if rebuild {
        library.index.reset().await?;
    }
    let catalog = library
        .catalog
        .load()
        .await
        .with_context(|| format!("cannot load catalog '{}'", library.config.catalog.path))?;
    let report = library.ingest.ingest(&catalog).await?;
    let indexed = library.index.count().await?;

    if json {
        let output = serde_json::json!({ "report": report, "indexed_chunks": indexed });
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(report);
    }

    println!();
    if report.is_noop() {
        println!(
            "  {} Index already up to date ({} books read)",
            style("✓").green().bold(),
            report.books_read
        );
    } else {
        println!(
            "  {} Added {} chunks to '{}'",
            style("✓").green().bold(),
            style(report.chunks_added).bold(),
            style(&library.config.catalog.table).cyan()
        );
    }
    println!();
    println!("{}", report_table(&report));
    println!();
    println!("  {} chunks indexed in total", style(indexed).bold());
    println!();

    Ok(report)
}

fn report_table(report: &IngestReport) -> Table {
    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![
        Cell::new("Books read").fg(Color::White),
        Cell::new("Skipped").fg(Color::White),
        Cell::new("Chunks planned").fg(Color::White),
        Cell::new("Chunks added").fg(Color::White),
    ]);

    let skipped = if report.books_skipped > 0 {
        Cell::new(report.books_skipped).fg(Color::Yellow)
    } else {
        Cell::new(report.books_skipped)
    };
    table.add_row(vec![
        Cell::new(report.books_read),
        skipped,
        Cell::new(report.chunks_planned),
        Cell::new(report.chunks_added).fg(Color::Green),
    ]);
    table
}

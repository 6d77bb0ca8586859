//! Catalog listing command.

use anyhow::Result;
use comfy_table::{Cell, Color, ContentArrangement, Table, presets};
use console::style;

use librarian_core::retrieval::catalog::list_titles;

use crate::state::LibraryState;

/// Print the distinct titles currently in the index.
pub async fn list_books(library: &LibraryState, json: bool) -> Result<()> {
    let titles = list_titles(
        library.index.as_ref(),
        library.config.retrieval.list_page_size,
    )
    .await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&titles)?);
        return Ok(());
    }

    if titles.is_empty() {
        println!();
        println!(
            "  {} The catalog is empty. Load it with: {}",
            style("i").blue().bold(),
            style("librarian ingest").yellow()
        );
        println!();
        return Ok(());
    }

    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![
        Cell::new("#").fg(Color::White),
        Cell::new("Title").fg(Color::White),
    ]);
    for (n, title) in titles.iter().enumerate() {
        table.add_row(vec![Cell::new(n + 1), Cell::new(title).fg(Color::Cyan)]);
    }

    println!();
    println!("{table}");
    println!();
    println!("  {} titles", style(titles.len()).bold());
    println!();

    Ok(())
}

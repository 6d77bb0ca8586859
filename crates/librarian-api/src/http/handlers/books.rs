//! Catalog listing endpoint.

use axum::Json;
use axum::extract::State;

use librarian_core::retrieval::catalog::list_titles;

use crate::http::error::AppError;
use crate::http::response::{ApiResponse, RequestClock};
use crate::state::AppState;

/// GET /api/v1/books - Distinct titles in the catalog, sorted case-insensitively.
pub async fn list_books(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<String>>>, AppError> {
    let clock = RequestClock::start();
    let library = &state.library;

    let titles = list_titles(library.index.as_ref(), library.config.retrieval.list_page_size).await?;

    Ok(Json(clock.finish(titles).with_link("self", "/api/v1/books")))
}

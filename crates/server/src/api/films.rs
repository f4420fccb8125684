//! Film catalog handlers.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::Html,
    Json,
};
use filmcat_core::{CatalogRender, ViewState};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

use crate::html::render_page;
use crate::state::AppState;

// ============================================================================
// Request/Response Types
// ============================================================================

/// Query parameters shared by the page and the JSON endpoint
#[derive(Debug, Deserialize)]
pub struct SearchParams {
    /// New search term; absent keeps the current one
    pub search: Option<String>,
}

/// Response for the catalog JSON endpoint
#[derive(Debug, Serialize)]
pub struct CatalogResponse {
    pub state: ViewState,
    pub search_term: String,
    pub render: CatalogRender,
}

/// Response for a refresh request
#[derive(Debug, Serialize)]
pub struct RefreshResponse {
    pub status: String,
}

/// Error response body
#[derive(Debug, Serialize)]
pub struct FilmsErrorResponse {
    pub error: String,
}

// ============================================================================
// Handlers
// ============================================================================

/// Render the catalog page
pub async fn films_page(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SearchParams>,
) -> Html<String> {
    let (term, render) = apply_search(&state, params).await;
    Html(render_page(&term, &render))
}

/// Get the catalog render as JSON
pub async fn get_films(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SearchParams>,
) -> Json<CatalogResponse> {
    let (search_term, render) = apply_search(&state, params).await;
    Json(CatalogResponse {
        state: render.state(),
        search_term,
        render,
    })
}

/// Refetch the film collection
pub async fn refresh_films(
    State(state): State<Arc<AppState>>,
) -> Result<(StatusCode, Json<RefreshResponse>), (StatusCode, Json<FilmsErrorResponse>)> {
    let view = state.view().read().await;
    match view.refresh() {
        Some(_) => Ok((
            StatusCode::ACCEPTED,
            Json(RefreshResponse {
                status: "refreshing".to_string(),
            }),
        )),
        None => Err((
            StatusCode::SERVICE_UNAVAILABLE,
            Json(FilmsErrorResponse {
                error: "Catalog view is not mounted".to_string(),
            }),
        )),
    }
}

/// Apply the optional search term and render the current frame.
async fn apply_search(state: &AppState, params: SearchParams) -> (String, CatalogRender) {
    match params.search {
        Some(term) => {
            let mut view = state.view().write().await;
            debug!(term = %term, "Search term updated");
            view.set_search_term(term);
            (view.search_term().to_string(), view.render())
        }
        None => {
            let view = state.view().read().await;
            (view.search_term().to_string(), view.render())
        }
    }
}

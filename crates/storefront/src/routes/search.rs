//! Search route handlers.

use axum::{Json, extract::State};
use serde::Deserialize;
use tracing::instrument;

use crate::error::Result;
use crate::services::SearchState;
use crate::state::AppState;

/// Search request.
#[derive(Debug, Deserialize)]
pub struct SearchRequest {
    pub query: String,
}

/// Current search state.
pub async fn show(State(state): State<AppState>) -> Json<SearchState> {
    Json(state.search().state().clone())
}

/// Run a query against the full catalog.
#[instrument(skip(state))]
pub async fn run(
    State(state): State<AppState>,
    Json(request): Json<SearchRequest>,
) -> Result<Json<SearchState>> {
    {
        let mut search = state.search();
        search.set_query(&request.query);
        search.begin();
    }

    let products = match state.catalog().list_products().await {
        Ok(products) => products,
        Err(e) => {
            state.search().clear();
            return Err(e.into());
        }
    };

    let mut search = state.search();
    Ok(Json(search.perform_search(&products, &request.query).clone()))
}

/// Reset the search.
pub async fn clear(State(state): State<AppState>) -> Json<SearchState> {
    let mut search = state.search();
    search.clear();
    Json(search.state().clone())
}

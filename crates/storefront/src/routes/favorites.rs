//! Favorites route handlers.

use axum::{
    Json,
    extract::{Path, State},
};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use kiosk_core::ProductId;

use crate::error::Result;
use crate::models::FavoriteItem;
use crate::state::AppState;

/// Save-a-product request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddFavoriteRequest {
    pub product_id: ProductId,
}

/// Favorites list response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FavoritesList {
    pub items: Vec<FavoriteItem>,
    pub count: usize,
}

/// Whether one product is saved.
#[derive(Debug, Serialize)]
pub struct FavoriteStatus {
    pub favorite: bool,
}

fn list(state: &AppState) -> Json<FavoritesList> {
    let favorites = state.favorites();
    Json(FavoritesList {
        items: favorites.items().to_vec(),
        count: favorites.len(),
    })
}

pub async fn index(State(state): State<AppState>) -> Json<FavoritesList> {
    list(&state)
}

/// Save a catalog product. Saving it twice changes nothing.
#[instrument(skip(state))]
pub async fn add(
    State(state): State<AppState>,
    Json(request): Json<AddFavoriteRequest>,
) -> Result<Json<FavoritesList>> {
    let product = state.catalog().get_product(request.product_id).await?;
    state.favorites().add(&product);
    Ok(list(&state))
}

pub async fn show(State(state): State<AppState>, Path(id): Path<ProductId>) -> Json<FavoriteStatus> {
    Json(FavoriteStatus {
        favorite: state.favorites().is_favorite(id),
    })
}

#[instrument(skip(state))]
pub async fn remove(State(state): State<AppState>, Path(id): Path<ProductId>) -> Json<FavoritesList> {
    state.favorites().remove(id);
    list(&state)
}

#[instrument(skip(state))]
pub async fn clear(State(state): State<AppState>) -> Json<FavoritesList> {
    state.favorites().clear();
    list(&state)
}

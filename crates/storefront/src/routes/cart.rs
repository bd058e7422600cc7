//! Cart route handlers.
//!
//! Lines are snapshots of the catalog product at the time it was added; the
//! catalog is only consulted on add.

use axum::{
    Json,
    extract::{Path, State},
};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use kiosk_core::ProductId;

use crate::error::{Result, add_breadcrumb};
use crate::models::CartProduct;
use crate::services::CartState;
use crate::state::AppState;

/// Add to cart request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddToCartRequest {
    pub product_id: ProductId,
    #[serde(default = "default_quantity")]
    pub quantity: u32,
}

const fn default_quantity() -> u32 {
    1
}

/// Update quantity request. Zero or below removes the line.
#[derive(Debug, Deserialize)]
pub struct UpdateQuantityRequest {
    pub quantity: i64,
}

/// Cart count response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartCount {
    pub total_items: u32,
}

/// Show the cart.
pub async fn show(State(state): State<AppState>) -> Json<CartState> {
    Json(state.cart().state())
}

/// Total item count for the cart badge.
pub async fn count(State(state): State<AppState>) -> Json<CartCount> {
    Json(CartCount {
        total_items: state.cart().total_items(),
    })
}

/// Add a catalog product to the cart.
#[instrument(skip(state))]
pub async fn add(
    State(state): State<AppState>,
    Json(request): Json<AddToCartRequest>,
) -> Result<Json<CartState>> {
    let product = state.catalog().get_product(request.product_id).await?;

    let product_id = request.product_id.to_string();
    add_breadcrumb("cart", "Added to cart", Some(&[("product_id", product_id.as_str())]));

    let mut cart = state.cart();
    cart.add(CartProduct::from(&product), request.quantity);
    Ok(Json(cart.state()))
}

/// Overwrite a line's quantity.
#[instrument(skip(state))]
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<ProductId>,
    Json(request): Json<UpdateQuantityRequest>,
) -> Json<CartState> {
    let mut cart = state.cart();
    cart.set_quantity(id, request.quantity);
    Json(cart.state())
}

/// Remove a line.
#[instrument(skip(state))]
pub async fn remove(State(state): State<AppState>, Path(id): Path<ProductId>) -> Json<CartState> {
    let mut cart = state.cart();
    cart.remove(id);
    Json(cart.state())
}

/// Empty the cart.
#[instrument(skip(state))]
pub async fn clear(State(state): State<AppState>) -> Json<CartState> {
    let mut cart = state.cart();
    cart.clear();
    Json(cart.state())
}

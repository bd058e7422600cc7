//! Catalog route handlers.

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use kiosk_core::{Product, ProductId};

use crate::catalog::{CategorySummary, ProductSort, listing};
use crate::error::{AppError, Result};
use crate::state::AppState;

/// Query parameters for the product listing.
#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub category: Option<String>,
    pub sort: Option<String>,
}

/// Product listing response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductList {
    pub products: Vec<Product>,
    pub total: usize,
    pub sort: ProductSort,
}

/// Product detail response, with the shopper's relation to the product.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductDetail {
    #[serde(flatten)]
    pub product: Product,
    pub in_cart: u32,
    pub is_favorite: bool,
}

/// List products, optionally filtered by category and sorted.
#[instrument(skip(state))]
pub async fn index(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<ProductList>> {
    let sort = query
        .sort
        .as_deref()
        .unwrap_or_default()
        .parse::<ProductSort>()
        .map_err(AppError::BadRequest)?;

    let products = state.catalog().list_products().await?;
    let mut products = listing::filter_by_category(products, query.category.as_deref());
    sort.apply(&mut products);

    Ok(Json(ProductList {
        total: products.len(),
        products,
        sort,
    }))
}

/// Show one product.
#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    Path(id): Path<ProductId>,
) -> Result<Json<ProductDetail>> {
    let product = state.catalog().get_product(id).await?;

    let in_cart = state.cart().item_quantity(id);
    let is_favorite = state.favorites().is_favorite(id);

    Ok(Json(ProductDetail {
        product,
        in_cart,
        is_favorite,
    }))
}

/// Categories in catalog order with product counts.
#[instrument(skip(state))]
pub async fn categories(State(state): State<AppState>) -> Result<Json<Vec<CategorySummary>>> {
    let products = state.catalog().list_products().await?;
    Ok(Json(listing::categories(&products)))
}

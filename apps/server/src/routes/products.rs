//! # Product Routes
//!
//! Catalog management. Every product belongs to exactly one company; the
//! company must exist before products can be created or moved into it.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use tracing::{debug, info};

use crate::error::ApiError;
use crate::AppState;
use kasir_core::validation::validate_search_query;
use kasir_core::{NewProduct, Product, ProductUpdate};

#[derive(Debug, Default, Deserialize)]
pub struct ProductListParams {
    pub company_id: Option<String>,
    pub search: Option<String>,
}

/// Body of a manual stock correction (restock, shrinkage).
#[derive(Debug, Deserialize)]
pub struct StockAdjustment {
    pub delta: i64,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/products", get(list_products).post(create_product))
        .route(
            "/api/products/{id}",
            get(get_product).put(update_product).delete(delete_product),
        )
        .route("/api/products/{id}/stock", post(adjust_stock))
}

/// Lists products, optionally for one company and matching a search on
/// name or code.
pub async fn list_products(
    State(state): State<AppState>,
    Query(params): Query<ProductListParams>,
) -> Result<Json<Vec<Product>>, ApiError> {
    let search = validate_search_query(params.search.as_deref())?;
    let company_id = params.company_id.as_deref().filter(|id| !id.trim().is_empty());

    let products = state
        .db
        .products()
        .list(company_id, search.as_deref())
        .await?;
    debug!(count = products.len(), "Products listed");
    Ok(Json(products))
}

pub async fn create_product(
    State(state): State<AppState>,
    Json(input): Json<NewProduct>,
) -> Result<(StatusCode, Json<Product>), ApiError> {
    input.validate()?;
    ensure_company(&state, &input.company_id).await?;

    let product = state.db.products().create(&input).await?;
    info!(id = %product.id, code = %product.code, "Product created");
    Ok((StatusCode::CREATED, Json(product)))
}

pub async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Product>, ApiError> {
    let product = state
        .db
        .products()
        .get_by_id(&id)
        .await?
        .ok_or_else(|| ApiError::not_found("Product", &id))?;
    Ok(Json(product))
}

/// Applies a partial update. Price and name changes never touch committed
/// orders, which keep their own snapshot.
pub async fn update_product(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(changes): Json<ProductUpdate>,
) -> Result<Json<Product>, ApiError> {
    changes.validate()?;
    if let Some(company_id) = changes.company_id.as_deref() {
        ensure_company(&state, company_id).await?;
    }

    let product = state.db.products().update(&id, &changes).await?;
    debug!(id = %id, "Product updated");
    Ok(Json(product))
}

pub async fn delete_product(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.db.products().delete(&id).await?;
    info!(id = %id, "Product deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// Adds `delta` (negative to remove) to the stock. A result below zero or
/// past the integer range is refused with 422.
pub async fn adjust_stock(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(adjustment): Json<StockAdjustment>,
) -> Result<Json<Product>, ApiError> {
    let product = state
        .db
        .products()
        .adjust_stock(&id, adjustment.delta)
        .await?;
    info!(id = %id, delta = adjustment.delta, stock = product.stock, "Stock adjusted");
    Ok(Json(product))
}

async fn ensure_company(state: &AppState, company_id: &str) -> Result<(), ApiError> {
    match state.db.companies().get_by_id(company_id).await? {
        Some(_) => Ok(()),
        None => Err(ApiError::not_found("Company", company_id)),
    }
}

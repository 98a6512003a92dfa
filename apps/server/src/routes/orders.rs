//! # Order Routes
//!
//! ## Checkout Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Cashier screen                                                        │
//! │       │                                                                 │
//! │       │  POST /api/orders/quote      live totals while the cart grows  │
//! │       │  (no writes)                                                    │
//! │       ▼                                                                 │
//! │  Customer pays                                                         │
//! │       │                                                                 │
//! │       │  POST /api/orders            x-operator-id: <user id>          │
//! │       │  { company_id, lines, discount_cents, paid_cents,               │
//! │       │    payment_method, notes?, expected? }                          │
//! │       ▼                                                                 │
//! │  OrderRepository::commit()   one transaction, all or nothing          │
//! │       │                                                                 │
//! │       ├── 201 Receipt                                                   │
//! │       ├── 4xx rule violation (nothing written)                          │
//! │       └── 409 lost a race for stock / the write lock                    │
//! │                                                                         │
//! │  GET /api/orders/{ORD-20250101-001}/receipt   reprint                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use tracing::debug;

use super::OperatorId;
use crate::error::ApiError;
use crate::AppState;
use kasir_core::validation::validate_search_query;
use kasir_core::{CheckoutRequest, OrderSummary, Quote, Receipt};
use kasir_db::OrderListQuery;

#[derive(Debug, Default, Deserialize)]
pub struct OrderListParams {
    pub company_id: Option<String>,
    pub search: Option<String>,
    pub limit: Option<u32>,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/orders", get(list_orders).post(submit_order))
        .route("/api/orders/quote", post(quote_order))
        .route("/api/orders/{reference}/receipt", get(get_receipt))
}

/// Commits a cart as an order on behalf of the operator in the header.
pub async fn submit_order(
    State(state): State<AppState>,
    OperatorId(operator_id): OperatorId,
    Json(request): Json<CheckoutRequest>,
) -> Result<(StatusCode, Json<Receipt>), ApiError> {
    let receipt = state.db.orders().commit(&operator_id, &request).await?;
    Ok((StatusCode::CREATED, Json(receipt)))
}

/// Prices a cart against the live catalog without writing anything.
pub async fn quote_order(
    State(state): State<AppState>,
    Json(request): Json<CheckoutRequest>,
) -> Result<Json<Quote>, ApiError> {
    let quote = state.db.orders().quote(&request).await?;
    debug!(
        company_id = %request.company_id,
        total = %quote.totals.total,
        "Cart quoted"
    );
    Ok(Json(quote))
}

/// Lists orders newest first, with company and operator names.
pub async fn list_orders(
    State(state): State<AppState>,
    Query(params): Query<OrderListParams>,
) -> Result<Json<Vec<OrderSummary>>, ApiError> {
    let query = OrderListQuery {
        company_id: params.company_id.filter(|id| !id.trim().is_empty()),
        search: validate_search_query(params.search.as_deref())?,
        limit: params.limit,
    };
    let orders = state.db.orders().list(&query).await?;
    Ok(Json(orders))
}

/// Loads a receipt by order id or order number.
pub async fn get_receipt(
    State(state): State<AppState>,
    Path(reference): Path<String>,
) -> Result<Json<Receipt>, ApiError> {
    let receipt = state
        .db
        .orders()
        .get_receipt(&reference)
        .await?
        .ok_or_else(|| ApiError::not_found("Order", &reference))?;
    Ok(Json(receipt))
}

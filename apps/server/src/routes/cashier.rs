//! # Cashier Screen
//!
//! Everything the point-of-sale screen needs in one request: active
//! companies with their sellable products, the latest orders, and the
//! display settings for totals.

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;

use crate::error::ApiError;
use crate::AppState;
use kasir_core::{Company, OrderSummary, Product, STANDARD_TAX_RATE};

#[derive(Debug, Serialize)]
pub struct CashierCompany {
    #[serde(flatten)]
    pub company: Company,
    pub products: Vec<Product>,
}

#[derive(Debug, Serialize)]
pub struct CashierScreen {
    pub companies: Vec<CashierCompany>,
    pub recent_orders: Vec<OrderSummary>,
    pub tax_rate_bps: u32,
    pub currency_symbol: String,
}

pub fn routes() -> Router<AppState> {
    Router::new().route("/api/cashier", get(cashier_screen))
}

pub async fn cashier_screen(State(state): State<AppState>) -> Result<Json<CashierScreen>, ApiError> {
    let active = state.db.companies().list_active().await?;

    let mut companies = Vec::with_capacity(active.len());
    for company in active {
        let products = state.db.products().list_sellable(&company.id).await?;
        companies.push(CashierCompany { company, products });
    }

    let recent_orders = state.db.orders().recent().await?;

    Ok(Json(CashierScreen {
        companies,
        recent_orders,
        tax_rate_bps: STANDARD_TAX_RATE.bps(),
        currency_symbol: state.config.store.currency_symbol.clone(),
    }))
}

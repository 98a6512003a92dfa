//! # Company Routes
//!
//! Tenant management plus the per-company sellable product list used by the
//! cashier screen.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use tracing::{debug, info};

use crate::error::ApiError;
use crate::AppState;
use kasir_core::validation::validate_search_query;
use kasir_core::{Company, CompanySummary, CompanyUpdate, NewCompany, Product};

#[derive(Debug, Default, Deserialize)]
pub struct CompanyListParams {
    pub search: Option<String>,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/companies", get(list_companies).post(create_company))
        .route(
            "/api/companies/{id}",
            get(get_company).put(update_company).delete(delete_company),
        )
        .route("/api/companies/{id}/sellable-products", get(sellable_products))
}

/// Lists companies with product and order counts.
pub async fn list_companies(
    State(state): State<AppState>,
    Query(params): Query<CompanyListParams>,
) -> Result<Json<Vec<CompanySummary>>, ApiError> {
    let search = validate_search_query(params.search.as_deref())?;
    let companies = state.db.companies().list(search.as_deref()).await?;
    Ok(Json(companies))
}

pub async fn create_company(
    State(state): State<AppState>,
    Json(input): Json<NewCompany>,
) -> Result<(StatusCode, Json<Company>), ApiError> {
    input.validate()?;
    let company = state.db.companies().create(&input).await?;
    info!(id = %company.id, name = %company.name, "Company created");
    Ok((StatusCode::CREATED, Json(company)))
}

pub async fn get_company(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Company>, ApiError> {
    let company = state
        .db
        .companies()
        .get_by_id(&id)
        .await?
        .ok_or_else(|| ApiError::not_found("Company", &id))?;
    Ok(Json(company))
}

pub async fn update_company(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(changes): Json<CompanyUpdate>,
) -> Result<Json<Company>, ApiError> {
    changes.validate()?;
    let company = state.db.companies().update(&id, &changes).await?;
    debug!(id = %id, "Company updated");
    Ok(Json(company))
}

/// Deletes a company with its products. Refused with 409 once the company
/// has orders.
pub async fn delete_company(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.db.companies().delete(&id).await?;
    info!(id = %id, "Company deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// Active, in-stock products of one company, ordered by name.
pub async fn sellable_products(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Vec<Product>>, ApiError> {
    if state.db.companies().get_by_id(&id).await?.is_none() {
        return Err(ApiError::not_found("Company", &id));
    }
    let products = state.db.products().list_sellable(&id).await?;
    Ok(Json(products))
}

#[cfg(test)]
mod tests {
    use crate::test_support::{send, test_app};
    use axum::http::StatusCode;
    use serde_json::json;

    #[tokio::test]
    async fn test_company_crud() {
        let (app, _db) = test_app().await;

        let (status, created) = send(
            &app,
            "POST",
            "/api/companies",
            Some(json!({ "name": "Warung Sembako Bahagia", "email": "bahagia@sembako.com" })),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(created["status"], "active");
        let id = created["id"].as_str().unwrap().to_string();

        let (status, listed) = send(&app, "GET", "/api/companies?search=sembako", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(listed.as_array().unwrap().len(), 1);
        assert_eq!(listed[0]["product_count"], 0);

        let (status, updated) = send(
            &app,
            "PUT",
            &format!("/api/companies/{}", id),
            Some(json!({ "status": "inactive" })),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(updated["status"], "inactive");
        assert_eq!(updated["name"], "Warung Sembako Bahagia");

        let (status, _) = send(&app, "DELETE", &format!("/api/companies/{}", id), None, None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let (status, body) = send(&app, "GET", &format!("/api/companies/{}", id), None, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["code"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn test_create_rejects_blank_name() {
        let (app, _db) = test_app().await;
        let (status, body) =
            send(&app, "POST", "/api/companies", Some(json!({ "name": "  " })), None).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_sellable_products_unknown_company() {
        let (app, _db) = test_app().await;
        let (status, _) =
            send(&app, "GET", "/api/companies/missing/sellable-products", None, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}

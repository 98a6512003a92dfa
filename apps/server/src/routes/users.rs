//! Operator registration and lookup.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use tracing::info;

use crate::error::ApiError;
use crate::AppState;
use kasir_core::{NewUser, User};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/users", post(create_user))
        .route("/api/users/{id}", get(get_user))
}

pub async fn create_user(
    State(state): State<AppState>,
    Json(input): Json<NewUser>,
) -> Result<(StatusCode, Json<User>), ApiError> {
    input.validate()?;

    if let Some(company_id) = input.company_id.as_deref() {
        if state.db.companies().get_by_id(company_id).await?.is_none() {
            return Err(ApiError::not_found("Company", company_id));
        }
    }

    let user = state.db.users().create(&input).await?;
    info!(id = %user.id, role = ?user.role, "Operator registered");
    Ok((StatusCode::CREATED, Json(user)))
}

pub async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<User>, ApiError> {
    let user = state
        .db
        .users()
        .get_by_id(&id)
        .await?
        .ok_or_else(|| ApiError::not_found("User", &id))?;
    Ok(Json(user))
}

//! Liveness endpoint.

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::AppState;

#[derive(Debug, Serialize)]
pub struct HealthStatus {
    pub status: &'static str,
    pub timestamp: DateTime<Utc>,
    pub database: &'static str,
}

pub fn routes() -> Router<AppState> {
    Router::new().route("/health-check", get(health_check))
}

/// `200 {status:"ok"}` when the database answers, `503 {status:"degraded"}`
/// otherwise.
pub async fn health_check(State(state): State<AppState>) -> (StatusCode, Json<HealthStatus>) {
    let healthy = state.db.health_check().await;

    let (code, status, database) = if healthy {
        (StatusCode::OK, "ok", "connected")
    } else {
        tracing::warn!("Health check failed: database unreachable");
        (StatusCode::SERVICE_UNAVAILABLE, "degraded", "unavailable")
    };

    (
        code,
        Json(HealthStatus {
            status,
            timestamp: Utc::now(),
            database,
        }),
    )
}

//! # Kasir POS Server
//!
//! HTTP JSON API over `kasir-core` and `kasir-db`.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Kasir Server                                     │
//! │                                                                         │
//! │  Cashier UI / admin UI                                                 │
//! │       │  JSON over HTTP                                                │
//! │       ▼                                                                 │
//! │  ┌──────────────────────────────────────────────────────────────────┐  │
//! │  │  main.rs ────► logging, config, database, listener               │  │
//! │  │  lib.rs  ────► router + shared state (this file)                 │  │
//! │  │  routes/ ────► companies, products, users, cashier, orders       │  │
//! │  │  error.rs ───► ApiError { code, message } → status + JSON        │  │
//! │  └──────────────────────────────────────────────────────────────────┘  │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite (WAL, foreign keys, busy timeout)                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

pub mod config;
pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use config::ServerConfig;
use kasir_db::Database;

pub use error::{ApiError, ErrorCode};

/// Shared state handed to every handler.
///
/// `Database` is a pool handle, so cloning the state per request is cheap.
#[derive(Debug, Clone)]
pub struct AppState {
    pub db: Database,
    pub config: Arc<ServerConfig>,
}

impl AppState {
    pub fn new(db: Database, config: ServerConfig) -> Self {
        AppState {
            db,
            config: Arc::new(config),
        }
    }
}

/// Builds the complete application router.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(routes::health::routes())
        .merge(routes::companies::routes())
        .merge(routes::products::routes())
        .merge(routes::users::routes())
        .merge(routes::cashier::routes())
        .merge(routes::orders::routes())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[cfg(test)]
pub(crate) mod test_support {
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use axum::Router;
    use http_body_util::BodyExt;
    use serde_json::Value;
    use tower::ServiceExt;

    use crate::config::ServerConfig;
    use crate::{build_router, AppState};
    use kasir_db::{Database, DbConfig};

    pub async fn test_app() -> (Router, Database) {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let app = build_router(AppState::new(db.clone(), ServerConfig::default()));
        (app, db)
    }

    /// Sends one request and returns the status with the parsed JSON body
    /// (`Value::Null` for empty bodies).
    pub async fn send(
        app: &Router,
        method: &str,
        uri: &str,
        body: Option<Value>,
        operator: Option<&str>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(op) = operator {
            builder = builder.header("x-operator-id", op);
        }
        let request = match body {
            Some(json) => builder
                .header("content-type", "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, json)
    }
}

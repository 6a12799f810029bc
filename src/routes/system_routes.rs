use axum::{
    extract::State,
    routing::get,
    Json, Router,
};
use serde_json::json;

use crate::config::AppConfig;
use crate::errors::IndexError;
use crate::persistence::SharedBackend;

#[derive(Clone)]
struct SystemState {
    server_version: String,
    store: SharedBackend,
}

pub fn routes(config: AppConfig, store: SharedBackend) -> Router {
    Router::new()
        .route("/alive", get(is_alive))
        .route("/version", get(version))
        .route("/health", get(health))
        .with_state(SystemState {
            server_version: config.server_version,
            store,
        })
}

/// GET /system/alive
async fn is_alive() -> &'static str {
    "OK"
}

/// GET /system/version
async fn version(State(state): State<SystemState>) -> Json<serde_json::Value> {
    Json(json!({
        "version": state.server_version
    }))
}

/// GET /system/health
///
/// Round-trips to the backend, so a dead database shows up as a 500.
async fn health(State(state): State<SystemState>) -> Result<Json<serde_json::Value>, IndexError> {
    let backend = state.store.describe().await?;
    Ok(Json(json!({
        "status": "ok",
        "backend": backend
    })))
}

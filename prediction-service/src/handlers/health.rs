use serde_json::{json, Value};
use service_core::axum::{extract::State, http::StatusCode, Json};

use crate::AppState;

/// Service health check
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service is healthy")
    ),
    tag = "Observability"
)]
pub async fn health_check(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": state.config.service_name,
        "version": state.config.service_version,
        "model": state.model.info().kind,
    }))
}

/// Readiness probe. The router only exists once a model is loaded.
#[utoipa::path(
    get,
    path = "/ready",
    responses(
        (status = 200, description = "Service is ready to predict")
    ),
    tag = "Observability"
)]
pub async fn readiness_check() -> (StatusCode, Json<Value>) {
    (StatusCode::OK, Json(json!({ "status": "ready" })))
}

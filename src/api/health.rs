//! Health check endpoint

use axum::{Json, Router, routing::get};
use serde::Serialize;

/// Health response
#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

/// Build the health router
#[must_use]
pub fn router() -> Router {
    Router::new().route("/health", get(health))
}

/// Liveness check
async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

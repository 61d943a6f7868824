//! Liveness and welcome endpoints.

use axum::Json;
use serde_json::{Value, json};

/// Liveness probe.
pub async fn health_check() -> Json<Value> {
    Json(json!({ "status": "healthy" }))
}

pub async fn root() -> Json<Value> {
    Json(json!({
        "message": "Welcome to SpaceHub API",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

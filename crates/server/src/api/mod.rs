//! Route handlers.

pub mod generate;
pub mod runs;
pub mod videos;

use axum::Json;
use serde_json::{json, Value};

/// GET / - liveness greeting
pub async fn root() -> Json<Value> {
    Json(json!({ "Hello": "World" }))
}

/// GET /health - service status
pub async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": "reelforge",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

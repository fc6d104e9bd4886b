// handlers/public/root.rs - GET / and GET /health
use axum::response::Json;
use chrono::{SecondsFormat, Utc};
use serde_json::{json, Value};

/// GET / - liveness banner with the current UTC time
pub async fn root() -> Json<Value> {
    Json(json!({
        "message": "API is running",
        "timestamp": Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true),
    }))
}

/// GET /health
pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

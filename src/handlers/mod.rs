pub mod products;

use axum::{
    http::{Method, Uri},
    Json,
};
use serde_json::json;

use crate::error::AppError;

/// Liveness check; answers without touching the store.
pub async fn health() -> Json<serde_json::Value> {
    Json(json!({ "ok": true, "message": "API Estoque" }))
}

pub async fn fallback(uri: Uri) -> AppError {
    AppError::NotFound(format!("No route for {}", uri.path()))
}

pub async fn method_not_allowed(method: Method, uri: Uri) -> AppError {
    AppError::MethodNotAllowed(format!("{} is not allowed on {}", method, uri.path()))
}

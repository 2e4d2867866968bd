use axum::{http::StatusCode, routing::get, Router};
use serde_json::json;

use crate::response::AppSuccess;

pub fn health_routes() -> Router {
    Router::new()
        .route("/", get(health))
        .route("/health", get(health))
}

async fn health() -> AppSuccess {
    AppSuccess::new(StatusCode::OK, "OK", json!({ "status": "alive" }))
}

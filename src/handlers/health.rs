// src/handlers/health.rs
use crate::models::api::HealthResponse;
use axum::{response::Json, routing::get, Router};

pub fn health_routes() -> Router {
    Router::new().route("/health", get(health_check))
}

async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse { status: "healthy" })
}

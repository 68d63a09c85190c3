// src/handlers/mcq.rs
use crate::error::AppError;
use crate::middleware::auth::auth_middleware;
use crate::models::api::{McqRequest, McqResponse};
use crate::AppState;
use axum::{extract::Extension, response::Json, routing::post, Router};
use std::sync::Arc;

pub fn mcq_routes() -> Router {
    Router::new()
        .route("/mcq", post(create_mcq))
        .layer(axum::middleware::from_fn(auth_middleware))
}

/// POST /mcq - documents to quiz video
async fn create_mcq(
    Extension(state): Extension<Arc<AppState>>,
    Json(request): Json<McqRequest>,
) -> Result<Json<McqResponse>, AppError> {
    tracing::info!("MCQ generation requested for project: {}", request.project_id);

    match state.mcq_service.process_request(&request).await {
        Ok(response) => {
            tracing::info!("MCQ generation complete for project: {}", request.project_id);
            Ok(Json(response))
        }
        Err(e) => {
            tracing::error!("❌ Error in MCQ generation: {}", e);
            Err(e.into())
        }
    }
}

// src/handlers/graph.rs
//! Quote-video workflow endpoints

use super::ensure_succeeded;
use crate::error::AppError;
use crate::middleware::auth::auth_middleware;
use crate::models::api::GraphRequest;
use crate::workflow::state::WorkflowState;
use crate::AppState;
use axum::{
    extract::{Extension, Path},
    response::Json,
    routing::{get, post},
    Router,
};
use std::sync::Arc;

pub fn graph_routes() -> Router {
    Router::new()
        .route("/graph", post(run_graph))
        .route("/graph/:thread_id", get(get_graph_state))
        .layer(axum::middleware::from_fn(auth_middleware))
}

/// POST /graph - run the pipeline to completion and return its final state
async fn run_graph(
    Extension(state): Extension<Arc<AppState>>,
    Json(request): Json<GraphRequest>,
) -> Result<Json<WorkflowState>, AppError> {
    let final_state = state
        .quote_workflow
        .run(request.topic, request.project_id, request.thread_id)
        .await?;

    Ok(Json(ensure_succeeded(final_state)?))
}

/// GET /graph/:thread_id - latest checkpointed state
async fn get_graph_state(
    Path(thread_id): Path<String>,
    Extension(state): Extension<Arc<AppState>>,
) -> Result<Json<WorkflowState>, AppError> {
    state
        .quote_workflow
        .get_state(&thread_id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("No workflow state for thread '{}'", thread_id)))
}

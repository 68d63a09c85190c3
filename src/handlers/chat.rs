// src/handlers/chat.rs
use super::ensure_succeeded;
use crate::error::AppError;
use crate::middleware::auth::auth_middleware;
use crate::models::api::{ChatRequest, ChatResponse, ResumeRequest};
use crate::workflow::state::WorkflowState;
use crate::AppState;
use axum::{
    extract::{Extension, Path},
    response::Json,
    routing::post,
    Router,
};
use std::sync::Arc;

pub fn chat_routes() -> Router {
    Router::new()
        .route("/chat", post(send_message))
        .route("/chat/:thread_id/resume", post(resume_thread))
        .layer(axum::middleware::from_fn(auth_middleware))
}

fn into_response(state: WorkflowState) -> Result<Json<ChatResponse>, AppError> {
    let state = ensure_succeeded(state)?;
    Ok(Json(ChatResponse {
        thread_id: state.thread_id,
        status: state.status,
        messages: state.messages,
        interrupt: state.interrupt,
    }))
}

async fn send_message(
    Extension(state): Extension<Arc<AppState>>,
    Json(request): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, AppError> {
    let result = state
        .chat_workflow
        .send(request.thread_id, request.project_id, request.message)
        .await?;
    into_response(result)
}

async fn resume_thread(
    Path(thread_id): Path<String>,
    Extension(state): Extension<Arc<AppState>>,
    Json(request): Json<ResumeRequest>,
) -> Result<Json<ChatResponse>, AppError> {
    tracing::info!(thread_id = %thread_id, "▶️ Resuming chat thread");
    let result = state.chat_workflow.resume(&thread_id, request.data).await?;
    into_response(result)
}

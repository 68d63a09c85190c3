// src/handlers/conversation.rs
use crate::middleware::auth::auth_middleware;
use crate::models::api::ConversationRequest;
use axum::{response::Json, routing::post, Router};

pub fn conversation_routes() -> Router {
    Router::new()
        .route("/conversation", post(conversation))
        .layer(axum::middleware::from_fn(auth_middleware))
}

/// Placeholder endpoint: echoes the user input back
async fn conversation(Json(request): Json<ConversationRequest>) -> Json<String> {
    tracing::info!(
        project_id = %request.project_id,
        video_type = %request.video_type,
        has_context = request.context.is_some(),
        "💬 Conversation request"
    );
    Json(request.user_input)
}

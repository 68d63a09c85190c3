// src/error.rs
use crate::models::api::ErrorResponse;
use crate::services::mcq::McqError;
use crate::workflow::chat::ChatError;
use crate::workflow::executor::ExecutorError;
use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Json, Response},
};
use thiserror::Error;

/// Errors surfaced to HTTP clients as `{"detail": ...}`
#[derive(Error, Debug)]
pub enum AppError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Unauthorized(&'static str),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    Internal(String),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = Json(ErrorResponse {
            detail: self.to_string(),
        });

        match self {
            AppError::Unauthorized(_) => {
                (status, [(header::WWW_AUTHENTICATE, "Bearer")], body).into_response()
            }
            _ => (status, body).into_response(),
        }
    }
}

impl From<ExecutorError> for AppError {
    fn from(err: ExecutorError) -> Self {
        match err {
            ExecutorError::ThreadNotFound(_) => AppError::NotFound(err.to_string()),
            ExecutorError::NotSuspended(_) => AppError::Conflict(err.to_string()),
            _ => AppError::Internal(err.to_string()),
        }
    }
}

impl From<McqError> for AppError {
    fn from(err: McqError) -> Self {
        match err {
            McqError::InvalidProjectId(_) => AppError::BadRequest(err.to_string()),
            _ => AppError::Internal(format!("MCQ generation failed: {}", err)),
        }
    }
}

impl From<ChatError> for AppError {
    fn from(err: ChatError) -> Self {
        match err {
            ChatError::AwaitingInput(_) => AppError::Conflict(err.to_string()),
            ChatError::Executor(inner) => inner.into(),
        }
    }
}

// src/handlers/mod.rs
pub mod chat;
pub mod conversation;
pub mod graph;
pub mod health;
pub mod mcq;

use crate::error::AppError;
use crate::workflow::state::{WorkflowState, WorkflowStatus};

/// A run that ended in `Failed` is reported as a server error
pub(crate) fn ensure_succeeded(state: WorkflowState) -> Result<WorkflowState, AppError> {
    if state.status != WorkflowStatus::Failed {
        return Ok(state);
    }

    let detail = state
        .last_error()
        .map(|e| format!("Workflow failed at '{}': {}", e.node, e.message))
        .unwrap_or_else(|| "Workflow failed".to_string());
    Err(AppError::Internal(detail))
}

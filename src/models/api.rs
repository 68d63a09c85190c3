// src/models/api.rs
//! Request and response bodies of the HTTP API.

use crate::llm_client::ChatMessage;
use crate::models::mcq::McqList;
use crate::workflow::state::{Interrupt, WorkflowStatus};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Deserialize)]
pub struct GraphRequest {
    #[serde(default)]
    pub topic: Option<String>,
    pub project_id: String,
    #[serde(default)]
    pub thread_id: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct McqRequest {
    pub project_id: String,
    pub system_prompt: String,
    #[serde(default)]
    pub asset_files: Vec<String>,
    pub user_prompt: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct McqResponse {
    pub project_id: String,
    pub mcqs: McqList,
    pub processed_files: usize,
}

#[derive(Debug, Deserialize)]
pub struct ConversationRequest {
    pub user_input: String,
    pub project_id: String,
    pub video_type: String,
    #[serde(default)]
    pub context: Option<Value>,
}

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub thread_id: Option<String>,
    #[serde(default)]
    pub project_id: Option<String>,
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct ResumeRequest {
    pub data: Value,
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub thread_id: String,
    pub status: WorkflowStatus,
    pub messages: Vec<ChatMessage>,
    pub interrupt: Option<Interrupt>,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub detail: String,
}

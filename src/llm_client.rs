// src/llm_client.rs
//! Chat-model abstraction shared by the workflow nodes and the MCQ service.
//!
//! A single provider is supported; the concrete client lives in
//! `openai_client.rs`. Everything above this seam talks to `dyn ChatModel`,
//! which is what the tests substitute.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::{json, Value};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LlmError {
    #[error("Unsupported provider: {0}")]
    UnsupportedProvider(String),
    #[error("LLM request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("LLM API error ({status}): {body}")]
    Api { status: u16, body: String },
    #[error("LLM returned an empty response")]
    EmptyResponse,
    #[error("LLM returned invalid JSON: {0}")]
    InvalidJson(String),
    #[error("Structured output validation failed: {0}")]
    Validation(String),
}

/// Closed set of supported chat-model providers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LlmProvider {
    OpenAi,
}

impl FromStr for LlmProvider {
    type Err = LlmError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "openai" => Ok(LlmProvider::OpenAi),
            _ => Err(LlmError::UnsupportedProvider(s.to_string())),
        }
    }
}

impl fmt::Display for LlmProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LlmProvider::OpenAi => write!(f, "openai"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
    Tool,
}

/// A tool invocation requested by the model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCallRequest {
    pub id: String,
    pub name: String,
    pub arguments: Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolCallRequest>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl ChatMessage {
    fn with_role(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            tool_calls: Vec::new(),
            tool_call_id: None,
            name: None,
            timestamp: Utc::now(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::with_role(Role::System, content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::with_role(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::with_role(Role::Assistant, content)
    }

    pub fn assistant_tool_calls(content: impl Into<String>, tool_calls: Vec<ToolCallRequest>) -> Self {
        let mut msg = Self::with_role(Role::Assistant, content);
        msg.tool_calls = tool_calls;
        msg
    }

    pub fn tool_result(tool_call_id: &str, name: &str, content: impl Into<String>) -> Self {
        let mut msg = Self::with_role(Role::Tool, content);
        msg.tool_call_id = Some(tool_call_id.to_string());
        msg.name = Some(name.to_string());
        msg
    }

    pub fn requests_tools(&self) -> bool {
        self.role == Role::Assistant && !self.tool_calls.is_empty()
    }
}

/// Tool declaration offered to the model
#[derive(Debug, Clone, Serialize)]
pub struct ToolSpec {
    pub name: String,
    pub description: String,
    pub parameters: Value,
}

/// Named JSON schema the model response must satisfy
#[derive(Debug, Clone)]
pub struct OutputSchema {
    pub name: &'static str,
    pub schema: Value,
}

#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Plain text completion
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String, LlmError>;

    /// Schema-constrained completion returning the parsed JSON value
    async fn complete_json(
        &self,
        messages: &[ChatMessage],
        schema: &OutputSchema,
    ) -> Result<Value, LlmError>;

    /// Completion with tools bound; the returned message may carry tool calls
    async fn complete_with_tools(
        &self,
        messages: &[ChatMessage],
        tools: &[ToolSpec],
    ) -> Result<ChatMessage, LlmError>;
}

/// A record the model can be asked to produce directly
pub trait StructuredOutput: DeserializeOwned + Serialize + Send {
    const NAME: &'static str;

    fn json_schema() -> Value;

    /// Constraints the JSON schema cannot express (or the provider may ignore)
    fn validate(&self) -> Result<(), String> {
        Ok(())
    }
}

/// Ask the model for `T` and reject anything that does not fit it.
pub async fn generate_structured<T: StructuredOutput>(
    model: &dyn ChatModel,
    messages: &[ChatMessage],
) -> Result<T, LlmError> {
    let schema = OutputSchema {
        name: T::NAME,
        schema: T::json_schema(),
    };

    let value = model.complete_json(messages, &schema).await?;
    let parsed: T = serde_json::from_value(value)
        .map_err(|e| LlmError::Validation(format!("{} does not match schema: {}", T::NAME, e)))?;
    parsed.validate().map_err(LlmError::Validation)?;

    Ok(parsed)
}

/// Strict object schema: every listed property is required and nothing else
/// is allowed.
pub fn object_schema(properties: Value) -> Value {
    let required: Vec<String> = properties
        .as_object()
        .map(|props| props.keys().cloned().collect())
        .unwrap_or_default();

    json!({
        "type": "object",
        "properties": properties,
        "required": required,
        "additionalProperties": false,
    })
}

pub fn string_schema(description: &str) -> Value {
    json!({ "type": "string", "description": description })
}

pub fn string_array_schema(description: &str) -> Value {
    json!({
        "type": "array",
        "description": description,
        "items": { "type": "string" },
    })
}

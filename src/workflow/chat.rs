// Chat workflow - tool-calling conversation with human-in-the-loop interrupts
use super::checkpoint::CheckpointStore;
use super::executor::{ExecutorBuilder, ExecutorError, WorkflowExecutor};
use super::graph::{GraphError, NodeFunction, NodeType, StateGraph, StateGraphBuilder};
use super::router::route_tools;
use super::state::{StateUpdate, WorkflowState, WorkflowStatus};
use crate::llm_client::{ChatMessage, ChatModel, Role};
use crate::prompts::CHAT_SYSTEM;
use crate::tools::{ToolOutcome, ToolRegistry};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::HashSet;
use std::sync::Arc;
use thiserror::Error;
use tracing::info;
use uuid::Uuid;

pub const CHATBOT: &str = "chatbot";
pub const TOOLS: &str = "tools";

#[derive(Error, Debug)]
pub enum ChatError {
    #[error("Thread '{0}' is awaiting input; resume it instead")]
    AwaitingInput(String),

    #[error(transparent)]
    Executor(#[from] ExecutorError),
}

/// LLM turn with every registered tool bound
pub struct ChatbotNode {
    model: Arc<dyn ChatModel>,
    tools: ToolRegistry,
}

impl ChatbotNode {
    pub fn new(model: Arc<dyn ChatModel>, tools: ToolRegistry) -> Self {
        Self { model, tools }
    }
}

#[async_trait]
impl NodeFunction for ChatbotNode {
    async fn execute(&self, state: &WorkflowState) -> Result<StateUpdate, String> {
        let mut messages = Vec::with_capacity(state.messages.len() + 1);
        messages.push(ChatMessage::system(CHAT_SYSTEM));
        messages.extend(state.messages.iter().cloned());

        let reply = self
            .model
            .complete_with_tools(&messages, &self.tools.specs())
            .await
            .map_err(|e| e.to_string())?;

        Ok(StateUpdate::new().with_message(reply))
    }
}

/// Runs the tool calls of the last assistant message
pub struct ToolNode {
    tools: ToolRegistry,
}

impl ToolNode {
    pub fn new(tools: ToolRegistry) -> Self {
        Self { tools }
    }
}

#[async_trait]
impl NodeFunction for ToolNode {
    async fn execute(&self, state: &WorkflowState) -> Result<StateUpdate, String> {
        let request_index = state
            .messages
            .iter()
            .rposition(|m| m.role == Role::Assistant)
            .filter(|&i| state.messages[i].requests_tools())
            .ok_or("No tool call found in input")?;
        let request = &state.messages[request_index];

        // Calls answered before an interrupt are not repeated on resume
        let answered: HashSet<&str> = state.messages[request_index + 1..]
            .iter()
            .filter_map(|m| m.tool_call_id.as_deref())
            .collect();

        let mut resume = state.resume.as_ref();
        let mut update = StateUpdate::new();

        for call in request
            .tool_calls
            .iter()
            .filter(|c| !answered.contains(c.id.as_str()))
        {
            let mut args = call.arguments.clone();
            if let (Some(obj), Some(project_id)) = (args.as_object_mut(), state.project_id.as_ref()) {
                obj.entry("project_id")
                    .or_insert_with(|| Value::String(project_id.clone()));
            }

            let outcome = self
                .tools
                .invoke(&call.name, args, resume.take())
                .await
                .map_err(|e| e.to_string())?;

            match outcome {
                ToolOutcome::Output(value) => {
                    let content = serde_json::to_string(&value).map_err(|e| e.to_string())?;
                    update = update.with_message(ChatMessage::tool_result(&call.id, &call.name, content));
                }
                ToolOutcome::Interrupt(value) => {
                    info!(tool = %call.name, "⏸️ Tool requested human input");
                    return Ok(update.with_interrupt(value));
                }
            }
        }

        Ok(update)
    }
}

pub fn build_graph(model: Arc<dyn ChatModel>, tools: ToolRegistry) -> Result<StateGraph, GraphError> {
    StateGraphBuilder::new()
        .add_node(
            CHATBOT,
            NodeType::Agent,
            Arc::new(ChatbotNode::new(model, tools.clone())),
            "LLM with tools bound",
        )
        .add_node(TOOLS, NodeType::Tool, Arc::new(ToolNode::new(tools)), "Dispatch requested tools")
        .set_entry_point(CHATBOT)
        .add_conditional_edge(CHATBOT, route_tools(TOOLS))
        .add_edge(TOOLS, CHATBOT)
        .build()
}

pub struct ChatWorkflow {
    executor: WorkflowExecutor,
}

impl ChatWorkflow {
    pub fn new(
        model: Arc<dyn ChatModel>,
        tools: ToolRegistry,
        checkpointer: Arc<dyn CheckpointStore>,
    ) -> Result<Self, GraphError> {
        let executor = ExecutorBuilder::new()
            .with_graph(build_graph(model, tools)?)
            .with_checkpointer(checkpointer)
            .build()?;
        Ok(Self { executor })
    }

    /// Send a user message, continuing the thread when it already exists
    pub async fn send(
        &self,
        thread_id: Option<String>,
        project_id: Option<String>,
        message: String,
    ) -> Result<WorkflowState, ChatError> {
        let existing = match &thread_id {
            Some(id) => self.executor.get_state(id).await?,
            None => None,
        };

        let mut state = match existing {
            Some(state) if state.status == WorkflowStatus::AwaitingInput => {
                return Err(ChatError::AwaitingInput(state.thread_id));
            }
            Some(mut state) => {
                state.pending_nodes.clear();
                state.completed_nodes.clear();
                state
            }
            None => {
                let workflow_id = Uuid::new_v4().to_string();
                let thread_id = thread_id.unwrap_or_else(|| workflow_id.clone());
                WorkflowState::new(workflow_id, thread_id)
            }
        };

        if project_id.is_some() {
            state.project_id = project_id;
        }
        state.messages.push(ChatMessage::user(message));

        Ok(self.executor.run(state).await?)
    }

    /// Answer a pending `human_assistance` call
    pub async fn resume(&self, thread_id: &str, data: Value) -> Result<WorkflowState, ChatError> {
        Ok(self.executor.resume(thread_id, json!({ "data": data })).await?)
    }
}

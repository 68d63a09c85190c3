// Tools callable by the chat graph, dispatched by name
pub mod human_assistance;
pub mod video_creation;

pub use human_assistance::HumanAssistanceTool;
pub use video_creation::{VideoContent, VideoCreationTool, VideoToolInput, VideoToolOutput};

use crate::llm_client::ToolSpec;
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ToolError {
    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    #[error("Invalid arguments for {tool}: {message}")]
    InvalidArguments { tool: String, message: String },

    #[error("{tool} failed: {message}")]
    Execution { tool: String, message: String },
}

/// Result of a tool call
#[derive(Debug, Clone, PartialEq)]
pub enum ToolOutcome {
    /// Fed back to the model as a tool message
    Output(Value),
    /// Suspend the run and surface this value to a person
    Interrupt(Value),
}

#[async_trait]
pub trait Tool: Send + Sync {
    fn name(&self) -> &'static str;

    fn description(&self) -> &'static str;

    /// JSON schema of the arguments object
    fn parameters(&self) -> Value;

    /// `resume` carries the externally supplied value when a suspended call is re-run
    async fn invoke(&self, args: Value, resume: Option<&Value>) -> Result<ToolOutcome, ToolError>;

    fn spec(&self) -> ToolSpec {
        ToolSpec {
            name: self.name().to_string(),
            description: self.description().to_string(),
            parameters: self.parameters(),
        }
    }
}

#[derive(Default, Clone)]
pub struct ToolRegistry {
    tools: HashMap<&'static str, Arc<dyn Tool>>,
    order: Vec<&'static str>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(mut self, tool: Arc<dyn Tool>) -> Self {
        let name = tool.name();
        if self.tools.insert(name, tool).is_none() {
            self.order.push(name);
        }
        self
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn Tool>> {
        self.tools.get(name)
    }

    /// Declarations to bind to the model, in registration order
    pub fn specs(&self) -> Vec<ToolSpec> {
        self.order
            .iter()
            .filter_map(|name| self.tools.get(name))
            .map(|tool| tool.spec())
            .collect()
    }

    pub async fn invoke(
        &self,
        name: &str,
        args: Value,
        resume: Option<&Value>,
    ) -> Result<ToolOutcome, ToolError> {
        let tool = self
            .get(name)
            .ok_or_else(|| ToolError::UnknownTool(name.to_string()))?;
        tracing::info!(tool = name, "🔧 Invoking tool");
        tool.invoke(args, resume).await
    }
}

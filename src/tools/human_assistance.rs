// src/tools/human_assistance.rs
use super::{Tool, ToolError, ToolOutcome};
use async_trait::async_trait;
use serde_json::{json, Value};

/// Pauses the run with `{"query": ...}`; the resumed call answers with the
/// `data` field of the supplied value.
pub struct HumanAssistanceTool;

#[async_trait]
impl Tool for HumanAssistanceTool {
    fn name(&self) -> &'static str {
        "human_assistance"
    }

    fn description(&self) -> &'static str {
        "Request assistance from a human."
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "query": { "type": "string", "description": "Question for the human" }
            },
            "required": ["query"],
        })
    }

    async fn invoke(&self, args: Value, resume: Option<&Value>) -> Result<ToolOutcome, ToolError> {
        if let Some(answer) = resume {
            let data = answer.get("data").cloned().unwrap_or(Value::Null);
            return Ok(ToolOutcome::Output(data));
        }

        let query = args
            .get("query")
            .and_then(Value::as_str)
            .ok_or_else(|| ToolError::InvalidArguments {
                tool: self.name().to_string(),
                message: "query is required".to_string(),
            })?;

        Ok(ToolOutcome::Interrupt(json!({ "query": query })))
    }
}

// Router - Conditional routing and decision logic
use super::graph::{RouterFunction, END};
use super::state::WorkflowState;
use std::sync::Arc;

/// Route to `tools_node` when the last message requests tool calls, else end
pub fn route_tools(tools_node: &str) -> RouterFunction {
    RouterBuilder::new()
        .when(
            |state: &WorkflowState| state.last_message().is_some_and(|m| m.requests_tools()),
            tools_node,
        )
        .otherwise(END)
        .build()
}

/// Custom router builder
pub struct RouterBuilder {
    conditions: Vec<(Box<dyn Fn(&WorkflowState) -> bool + Send + Sync>, String)>,
    default: Option<String>,
}

impl RouterBuilder {
    pub fn new() -> Self {
        Self {
            conditions: Vec::new(),
            default: None,
        }
    }

    /// Add condition with target node
    pub fn when<F>(mut self, condition: F, target: &str) -> Self
    where
        F: Fn(&WorkflowState) -> bool + Send + Sync + 'static,
    {
        self.conditions.push((Box::new(condition), target.to_string()));
        self
    }

    /// Set default target if no conditions match
    pub fn otherwise(mut self, target: &str) -> Self {
        self.default = Some(target.to_string());
        self
    }

    pub fn build(self) -> RouterFunction {
        Arc::new(move |state: &WorkflowState| {
            self.conditions
                .iter()
                .find(|(condition, _)| condition(state))
                .map(|(_, target)| target.clone())
                .or_else(|| self.default.clone())
        })
    }
}

impl Default for RouterBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm_client::{ChatMessage, ToolCallRequest};
    use serde_json::json;

    #[test]
    fn test_route_tools() {
        let router = route_tools("tools");
        let mut state = WorkflowState::new("wf".into(), "t".into());
        assert_eq!(router(&state).as_deref(), Some(END));

        state.messages.push(ChatMessage::assistant("plain answer"));
        assert_eq!(router(&state).as_deref(), Some(END));

        state.messages.push(ChatMessage::assistant_tool_calls(
            "",
            vec![ToolCallRequest {
                id: "call_1".into(),
                name: "create_video".into(),
                arguments: json!({}),
            }],
        ));
        assert_eq!(router(&state).as_deref(), Some("tools"));
    }

    #[test]
    fn test_first_matching_condition_wins() {
        let router = RouterBuilder::new()
            .when(|s| s.topic.is_some(), "has_topic")
            .when(|_| true, "always")
            .build();
        let mut state = WorkflowState::new("wf".into(), "t".into());
        assert_eq!(router(&state).as_deref(), Some("always"));
        state.topic = Some("x".into());
        assert_eq!(router(&state).as_deref(), Some("has_topic"));
    }

    #[test]
    fn test_no_default_yields_none() {
        let router = RouterBuilder::new().when(|_| false, "never").build();
        let state = WorkflowState::new("wf".into(), "t".into());
        assert!(router(&state).is_none());
    }
}

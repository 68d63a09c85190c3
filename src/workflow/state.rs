// WorkflowState - Shared record carried across graph nodes, merged by per-key reducers
use crate::llm_client::ChatMessage;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// State reducer strategy for merging state updates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReducerStrategy {
    /// Replace old value with new value
    Replace,
    /// Append new values to the list
    Append,
    /// Keep first value (ignore updates once set)
    KeepFirst,
}

/// Keys of the state that updates are merged into
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StateKey {
    Messages,
    Topic,
    ProjectId,
    Titles,
    ThumbnailTextList,
    BestTitle,
    BestThumbnailText,
    Quotes,
    Description,
    ThumbnailVisualDesc,
    VideoId,
    VideoUrl,
}

/// Per-key merge rules; keys without an entry use the default for their kind
#[derive(Debug, Clone)]
pub struct Reducers {
    strategies: HashMap<StateKey, ReducerStrategy>,
}

impl Default for Reducers {
    fn default() -> Self {
        let mut strategies = HashMap::new();
        strategies.insert(StateKey::Messages, ReducerStrategy::Append);
        Self { strategies }
    }
}

impl Reducers {
    pub fn with(mut self, key: StateKey, strategy: ReducerStrategy) -> Self {
        self.strategies.insert(key, strategy);
        self
    }

    pub fn strategy(&self, key: StateKey) -> ReducerStrategy {
        self.strategies
            .get(&key)
            .copied()
            .unwrap_or(ReducerStrategy::Replace)
    }
}

fn reduce_scalar<T>(key: StateKey, reducers: &Reducers, current: &mut Option<T>, update: Option<T>) {
    let Some(value) = update else { return };
    match reducers.strategy(key) {
        ReducerStrategy::KeepFirst if current.is_some() => {}
        _ => *current = Some(value),
    }
}

fn reduce_list<T>(key: StateKey, reducers: &Reducers, current: &mut Vec<T>, update: Option<Vec<T>>) {
    let Some(values) = update else { return };
    match reducers.strategy(key) {
        ReducerStrategy::Append => current.extend(values),
        ReducerStrategy::KeepFirst if !current.is_empty() => {}
        _ => *current = values,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowStatus {
    Initializing,
    Running,
    AwaitingInput, // Human-in-the-loop
    Completed,
    Failed,
}

/// Surfaced query of a suspended run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Interrupt {
    pub node: String,
    pub value: Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowError {
    pub node: String,
    pub error_type: String,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

/// WorkflowState - The core state object passed between nodes
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowState {
    /// Unique workflow execution ID
    pub workflow_id: String,

    /// Thread ID for checkpoint persistence and resume
    pub thread_id: String,

    pub status: WorkflowStatus,

    /// Conversation messages (appended, not replaced)
    pub messages: Vec<ChatMessage>,

    pub topic: Option<String>,
    pub project_id: Option<String>,
    pub titles: Vec<String>,
    pub thumbnail_text_list: Vec<String>,
    pub best_title: Option<String>,
    pub best_thumbnail_text: Option<String>,
    pub quotes: Vec<String>,
    pub description: Option<String>,
    pub thumbnail_visual_desc: Option<String>,
    pub video_id: Option<String>,
    pub video_url: Option<String>,

    /// Nodes scheduled for the next step; non-empty while a run is suspended
    pub pending_nodes: Vec<String>,

    /// Nodes finished since their join target last ran (fan-in bookkeeping)
    pub completed_nodes: Vec<String>,

    pub interrupt: Option<Interrupt>,

    /// Externally supplied value consumed by the interrupted node on resume
    pub resume: Option<Value>,

    pub errors: Vec<WorkflowError>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl WorkflowState {
    pub fn new(workflow_id: String, thread_id: String) -> Self {
        let now = Utc::now();
        Self {
            workflow_id,
            thread_id,
            status: WorkflowStatus::Initializing,
            messages: Vec::new(),
            topic: None,
            project_id: None,
            titles: Vec::new(),
            thumbnail_text_list: Vec::new(),
            best_title: None,
            best_thumbnail_text: None,
            quotes: Vec::new(),
            description: None,
            thumbnail_visual_desc: None,
            video_id: None,
            video_url: None,
            pending_nodes: Vec::new(),
            completed_nodes: Vec::new(),
            interrupt: None,
            resume: None,
            errors: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Apply a node's partial update using the given reducers
    pub fn apply_update(&mut self, update: StateUpdate, reducers: &Reducers) {
        self.updated_at = Utc::now();

        reduce_list(StateKey::Messages, reducers, &mut self.messages, update.messages);
        reduce_scalar(StateKey::Topic, reducers, &mut self.topic, update.topic);
        reduce_scalar(StateKey::ProjectId, reducers, &mut self.project_id, update.project_id);
        reduce_list(StateKey::Titles, reducers, &mut self.titles, update.titles);
        reduce_list(
            StateKey::ThumbnailTextList,
            reducers,
            &mut self.thumbnail_text_list,
            update.thumbnail_text_list,
        );
        reduce_scalar(StateKey::BestTitle, reducers, &mut self.best_title, update.best_title);
        reduce_scalar(
            StateKey::BestThumbnailText,
            reducers,
            &mut self.best_thumbnail_text,
            update.best_thumbnail_text,
        );
        reduce_list(StateKey::Quotes, reducers, &mut self.quotes, update.quotes);
        reduce_scalar(StateKey::Description, reducers, &mut self.description, update.description);
        reduce_scalar(
            StateKey::ThumbnailVisualDesc,
            reducers,
            &mut self.thumbnail_visual_desc,
            update.thumbnail_visual_desc,
        );
        reduce_scalar(StateKey::VideoId, reducers, &mut self.video_id, update.video_id);
        reduce_scalar(StateKey::VideoUrl, reducers, &mut self.video_url, update.video_url);
    }

    /// Values exposed to prompt templates
    pub fn template_vars(&self) -> HashMap<&'static str, String> {
        let mut vars = HashMap::new();
        let list = |items: &[String]| serde_json::to_string(items).unwrap_or_default();

        if let Some(topic) = &self.topic {
            vars.insert("topic", topic.clone());
        }
        if !self.titles.is_empty() {
            vars.insert("titles", list(&self.titles));
        }
        if !self.thumbnail_text_list.is_empty() {
            vars.insert("thumbnail_text_list", list(&self.thumbnail_text_list));
        }
        if let Some(title) = &self.best_title {
            vars.insert("best_title", title.clone());
        }
        if let Some(text) = &self.best_thumbnail_text {
            vars.insert("best_thumbnail_text", text.clone());
        }
        vars
    }

    pub fn last_message(&self) -> Option<&ChatMessage> {
        self.messages.last()
    }

    pub fn is_completed(&self) -> bool {
        matches!(self.status, WorkflowStatus::Completed | WorkflowStatus::Failed)
    }

    pub fn last_error(&self) -> Option<&WorkflowError> {
        self.errors.last()
    }
}

/// Partial state returned by a node
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StateUpdate {
    pub messages: Option<Vec<ChatMessage>>,
    pub topic: Option<String>,
    pub project_id: Option<String>,
    pub titles: Option<Vec<String>>,
    pub thumbnail_text_list: Option<Vec<String>>,
    pub best_title: Option<String>,
    pub best_thumbnail_text: Option<String>,
    pub quotes: Option<Vec<String>>,
    pub description: Option<String>,
    pub thumbnail_visual_desc: Option<String>,
    pub video_id: Option<String>,
    pub video_url: Option<String>,

    /// Suspend the run after this step and surface the value to the caller
    pub interrupt: Option<Value>,
}

impl StateUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_message(mut self, message: ChatMessage) -> Self {
        self.messages.get_or_insert_with(Vec::new).push(message);
        self
    }

    pub fn with_messages(mut self, messages: Vec<ChatMessage>) -> Self {
        self.messages.get_or_insert_with(Vec::new).extend(messages);
        self
    }

    pub fn with_interrupt(mut self, value: Value) -> Self {
        self.interrupt = Some(value);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_none()
            && self.topic.is_none()
            && self.project_id.is_none()
            && self.titles.is_none()
            && self.thumbnail_text_list.is_none()
            && self.best_title.is_none()
            && self.best_thumbnail_text.is_none()
            && self.quotes.is_none()
            && self.description.is_none()
            && self.thumbnail_visual_desc.is_none()
            && self.video_id.is_none()
            && self.video_url.is_none()
            && self.interrupt.is_none()
    }
}

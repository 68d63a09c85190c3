// Quote video workflow - topic to titles, quotes, description and a rendered video
use super::checkpoint::CheckpointStore;
use super::executor::{ExecutorBuilder, ExecutorError, WorkflowExecutor};
use super::graph::{GraphError, NodeFunction, NodeType, StateGraphBuilder, END};
use super::state::{StateUpdate, WorkflowState};
use crate::llm_client::{generate_structured, ChatModel, StructuredOutput};
use crate::models::quote::{
    BestTitleAndThumbnailText, Description, Quotes, ThumbnailVisualDesc, TitleAndThumbnailTextLists,
};
use crate::prompts::{self, PromptTemplate};
use crate::tools::{VideoContent, VideoCreationTool, VideoToolInput};
use crate::topics::random_topic;
use async_trait::async_trait;
use std::marker::PhantomData;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

pub const GENERATE_TITLES_AND_THUMBNAILS: &str = "generate_titles_and_thumbnails";
pub const SELECT_BEST: &str = "select_best";
pub const GENERATE_QUOTES: &str = "generate_quotes";
pub const GENERATE_THUMBNAIL_VISUAL_DESC: &str = "generate_thumbnail_visual_desc";
pub const GENERATE_DESCRIPTION: &str = "generate_description";
pub const CREATE_VIDEO: &str = "create_video";

/// Renders a template from state, asks the model for `T`, maps it into an update
pub struct StructuredPromptNode<T> {
    model: Arc<dyn ChatModel>,
    template: PromptTemplate,
    apply: fn(T) -> StateUpdate,
    _output: PhantomData<fn() -> T>,
}

impl<T> StructuredPromptNode<T> {
    pub fn new(model: Arc<dyn ChatModel>, template: PromptTemplate, apply: fn(T) -> StateUpdate) -> Self {
        Self {
            model,
            template,
            apply,
            _output: PhantomData,
        }
    }
}

#[async_trait]
impl<T: StructuredOutput + 'static> NodeFunction for StructuredPromptNode<T> {
    async fn execute(&self, state: &WorkflowState) -> Result<StateUpdate, String> {
        let messages = self
            .template
            .render(&state.template_vars())
            .map_err(|e| e.to_string())?;

        let output: T = generate_structured(self.model.as_ref(), &messages)
            .await
            .map_err(|e| format!("{}: {}", T::NAME, e))?;

        Ok((self.apply)(output))
    }
}

/// Final step: send everything gathered so far to the video API
pub struct CreateVideoNode {
    tool: Arc<VideoCreationTool>,
}

impl CreateVideoNode {
    pub fn new(tool: Arc<VideoCreationTool>) -> Self {
        Self { tool }
    }

    fn missing_fields(state: &WorkflowState) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if state.best_title.is_none() {
            missing.push("best_title");
        }
        if state.description.is_none() {
            missing.push("description");
        }
        if state.best_thumbnail_text.is_none() {
            missing.push("best_thumbnail_text");
        }
        if state.thumbnail_visual_desc.is_none() {
            missing.push("thumbnail_visual_desc");
        }
        if state.quotes.is_empty() {
            missing.push("quotes");
        }
        if state.project_id.is_none() {
            missing.push("project_id");
        }
        missing
    }
}

#[async_trait]
impl NodeFunction for CreateVideoNode {
    async fn execute(&self, state: &WorkflowState) -> Result<StateUpdate, String> {
        let missing = Self::missing_fields(state);
        if !missing.is_empty() {
            // Soft failure: the run still completes, just without a video
            warn!(
                workflow_id = %state.workflow_id,
                "⚠️ Skipping video creation, missing fields: {}",
                missing.join(", ")
            );
            return Ok(StateUpdate::new());
        }

        let input = VideoToolInput {
            title: state.best_title.clone().unwrap_or_default(),
            desc: state.description.clone().unwrap_or_default(),
            thumbnail_text: state.best_thumbnail_text.clone().unwrap_or_default(),
            thumbnail_visual_desc: state.thumbnail_visual_desc.clone().unwrap_or_default(),
            content: VideoContent::Message(state.quotes.clone()),
            project_id: state.project_id.clone().unwrap_or_default(),
        };

        let output = self.tool.create(input).await.map_err(|e| e.to_string())?;

        Ok(StateUpdate {
            video_id: Some(output.video_id),
            video_url: Some(output.video_url),
            ..Default::default()
        })
    }
}

pub fn build_graph(
    model: Arc<dyn ChatModel>,
    video_tool: Arc<VideoCreationTool>,
) -> Result<super::graph::StateGraph, GraphError> {
    let titles = StructuredPromptNode::new(
        model.clone(),
        prompts::TITLES_AND_THUMBNAILS,
        |out: TitleAndThumbnailTextLists| StateUpdate {
            titles: Some(out.titles),
            thumbnail_text_list: Some(out.thumbnail_text_list),
            ..Default::default()
        },
    );
    let best = StructuredPromptNode::new(
        model.clone(),
        prompts::SELECT_BEST_TITLE_AND_THUMBNAIL,
        |out: BestTitleAndThumbnailText| StateUpdate {
            best_title: Some(out.best_title),
            best_thumbnail_text: Some(out.best_thumbnail_text),
            ..Default::default()
        },
    );
    let quotes = StructuredPromptNode::new(model.clone(), prompts::QUOTES, |out: Quotes| StateUpdate {
        quotes: Some(out.quotes),
        ..Default::default()
    });
    let visual = StructuredPromptNode::new(
        model.clone(),
        prompts::THUMBNAIL_VISUAL_DESC,
        |out: ThumbnailVisualDesc| StateUpdate {
            thumbnail_visual_desc: Some(out.thumbnail_visual_desc),
            ..Default::default()
        },
    );
    let description = StructuredPromptNode::new(model, prompts::DESCRIPTION, |out: Description| StateUpdate {
        description: Some(out.description),
        ..Default::default()
    });

    StateGraphBuilder::new()
        .add_node(
            GENERATE_TITLES_AND_THUMBNAILS,
            NodeType::Agent,
            Arc::new(titles),
            "Candidate titles and thumbnail texts for the topic",
        )
        .add_node(SELECT_BEST, NodeType::Agent, Arc::new(best), "Pick the best title and thumbnail text")
        .add_node(GENERATE_QUOTES, NodeType::Agent, Arc::new(quotes), "Quotes for the chosen title")
        .add_node(
            GENERATE_THUMBNAIL_VISUAL_DESC,
            NodeType::Agent,
            Arc::new(visual),
            "Image prompt for the thumbnail",
        )
        .add_node(
            GENERATE_DESCRIPTION,
            NodeType::Agent,
            Arc::new(description),
            "Video description",
        )
        .add_node(
            CREATE_VIDEO,
            NodeType::Action,
            Arc::new(CreateVideoNode::new(video_tool)),
            "Render the video through the video API",
        )
        .set_entry_point(GENERATE_TITLES_AND_THUMBNAILS)
        .add_edge(GENERATE_TITLES_AND_THUMBNAILS, SELECT_BEST)
        .add_parallel_edges(
            SELECT_BEST,
            &[GENERATE_QUOTES, GENERATE_THUMBNAIL_VISUAL_DESC, GENERATE_DESCRIPTION],
        )
        .add_join(
            &[GENERATE_QUOTES, GENERATE_THUMBNAIL_VISUAL_DESC, GENERATE_DESCRIPTION],
            CREATE_VIDEO,
        )
        .add_edge(CREATE_VIDEO, END)
        .build()
}

pub struct QuoteVideoWorkflow {
    executor: WorkflowExecutor,
}

impl QuoteVideoWorkflow {
    pub fn new(
        model: Arc<dyn ChatModel>,
        video_tool: Arc<VideoCreationTool>,
        checkpointer: Arc<dyn CheckpointStore>,
    ) -> Result<Self, GraphError> {
        let executor = ExecutorBuilder::new()
            .with_graph(build_graph(model, video_tool)?)
            .with_checkpointer(checkpointer)
            .build()?;
        Ok(Self { executor })
    }

    /// Run the whole pipeline; a missing topic is drawn from the catalog
    pub async fn run(
        &self,
        topic: Option<String>,
        project_id: String,
        thread_id: Option<String>,
    ) -> Result<WorkflowState, ExecutorError> {
        let workflow_id = Uuid::new_v4().to_string();
        let thread_id = thread_id.unwrap_or_else(|| workflow_id.clone());

        let topic = topic
            .filter(|t| !t.trim().is_empty())
            .unwrap_or_else(|| random_topic().to_string());
        info!(topic = %topic, project_id = %project_id, "🎥 Quote video workflow requested");

        let mut state = WorkflowState::new(workflow_id, thread_id);
        state.topic = Some(topic);
        state.project_id = Some(project_id);

        self.executor.run(state).await
    }

    pub async fn get_state(&self, thread_id: &str) -> Result<Option<WorkflowState>, ExecutorError> {
        self.executor.get_state(thread_id).await
    }
}

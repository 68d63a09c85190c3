// src/tools/video_creation.rs
use super::{Tool, ToolError, ToolOutcome};
use crate::models::McqQuestion;
use crate::video_client::{CreateVideoRequest, VideoApiError, VideoCreator, VideoType};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::info;

/// Scene payload of a video
#[derive(Debug, Clone, PartialEq)]
pub enum VideoContent {
    Message(Vec<String>),
    Mcq(Vec<McqQuestion>),
}

impl VideoContent {
    pub fn video_type(&self) -> VideoType {
        match self {
            VideoContent::Message(_) => VideoType::Message,
            VideoContent::Mcq(_) => VideoType::Mcq,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            VideoContent::Message(quotes) => quotes.len(),
            VideoContent::Mcq(questions) => questions.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Plain JSON for the `raw` field
    pub fn to_raw(&self) -> Value {
        match self {
            VideoContent::Message(quotes) => Value::from(quotes.clone()),
            VideoContent::Mcq(questions) => serde_json::to_value(questions).unwrap_or(Value::Null),
        }
    }

    fn unit(&self) -> &'static str {
        match self {
            VideoContent::Message(_) => "quotes",
            VideoContent::Mcq(_) => "questions",
        }
    }
}

#[derive(Debug, Clone)]
pub struct VideoToolInput {
    pub title: String,
    pub desc: String,
    pub thumbnail_text: String,
    pub thumbnail_visual_desc: String,
    pub content: VideoContent,
    pub project_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VideoToolOutput {
    pub status: &'static str,
    pub message: String,
    pub video_id: String,
    pub video_url: String,
}

/// Arguments as the model (or a caller) sends them
#[derive(Debug, Deserialize)]
struct VideoToolArgs {
    title: String,
    desc: String,
    thumbnail_text: String,
    thumbnail_visual_desc: String,
    #[serde(default)]
    video_type: Option<VideoType>,
    #[serde(default)]
    quotes: Vec<String>,
    #[serde(default)]
    mcqs: Vec<McqQuestion>,
    project_id: String,
}

impl From<VideoToolArgs> for VideoToolInput {
    fn from(args: VideoToolArgs) -> Self {
        let content = match args.video_type.unwrap_or(VideoType::Message) {
            VideoType::Message => VideoContent::Message(args.quotes),
            VideoType::Mcq => VideoContent::Mcq(args.mcqs),
        };

        Self {
            title: args.title,
            desc: args.desc,
            thumbnail_text: args.thumbnail_text,
            thumbnail_visual_desc: args.thumbnail_visual_desc,
            content,
            project_id: args.project_id,
        }
    }
}

pub struct VideoCreationTool {
    creator: Arc<dyn VideoCreator>,
}

impl VideoCreationTool {
    pub fn new(creator: Arc<dyn VideoCreator>) -> Self {
        Self { creator }
    }

    pub async fn create(&self, input: VideoToolInput) -> Result<VideoToolOutput, VideoApiError> {
        info!(
            project_id = %input.project_id,
            thumbnail_text = %input.thumbnail_text,
            "Creating video with title: {}",
            input.title
        );

        let request = CreateVideoRequest {
            project_id: input.project_id,
            name: input.title.clone(),
            description: input.desc,
            visual_prompt: input.thumbnail_visual_desc,
            raw: input.content.to_raw(),
            video_type: input.content.video_type(),
        };

        let created = self.creator.create_video(&request).await?;

        Ok(VideoToolOutput {
            status: "success",
            message: format!(
                "Video '{}' created successfully with {} {}.",
                input.title,
                input.content.len(),
                input.content.unit()
            ),
            video_id: created.video_id,
            video_url: created.video_url,
        })
    }
}

#[async_trait]
impl Tool for VideoCreationTool {
    fn name(&self) -> &'static str {
        "create_video"
    }

    fn description(&self) -> &'static str {
        "Create a video with the given title, description, and quotes."
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "title": { "type": "string", "description": "The title of the video" },
                "desc": { "type": "string", "description": "The description of the video" },
                "thumbnail_text": { "type": "string", "description": "Text displayed on the thumbnail" },
                "thumbnail_visual_desc": { "type": "string", "description": "Visual description for the thumbnail" },
                "quotes": { "type": "array", "items": { "type": "string" }, "description": "Quotes to include in the video" },
                "video_type": { "type": "string", "enum": ["message", "mcq"] },
                "project_id": { "type": "string", "description": "The ID of the project for video creation" },
            },
            "required": ["title", "desc", "thumbnail_text", "thumbnail_visual_desc", "quotes"],
        })
    }

    async fn invoke(&self, args: Value, _resume: Option<&Value>) -> Result<ToolOutcome, ToolError> {
        let args: VideoToolArgs =
            serde_json::from_value(args).map_err(|e| ToolError::InvalidArguments {
                tool: self.name().to_string(),
                message: e.to_string(),
            })?;

        let output = self
            .create(args.into())
            .await
            .map_err(|e| ToolError::Execution {
                tool: self.name().to_string(),
                message: e.to_string(),
            })?;

        serde_json::to_value(output)
            .map(ToolOutcome::Output)
            .map_err(|e| ToolError::Execution {
                tool: self.name().to_string(),
                message: e.to_string(),
            })
    }
}

// Test doubles shared by the unit test modules
use crate::config::AppConfig;
use crate::llm_client::{ChatMessage, ChatModel, LlmError, OutputSchema, ToolSpec};
use crate::models::{McqList, McqOption, McqQuestion};
use crate::services::ocr::{OcrEngine, OcrError, TextExtractor};
use crate::services::s3::{AssetDownloader, DownloadError};
use crate::video_client::{CreateVideoRequest, CreatedVideo, VideoApiError, VideoCreator};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::{HashMap, HashSet, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// Chat model answering from canned responses keyed by schema name
#[derive(Default)]
pub struct ScriptedModel {
    json: HashMap<String, Value>,
    failing: HashSet<String>,
    replies: Mutex<VecDeque<ChatMessage>>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_json(mut self, schema_name: &str, value: Value) -> Self {
        self.json.insert(schema_name.to_string(), value);
        self
    }

    pub fn failing_for(mut self, schema_name: &str) -> Self {
        self.failing.insert(schema_name.to_string());
        self
    }

    /// Queue a reply for `complete_with_tools`
    pub fn with_reply(self, reply: ChatMessage) -> Self {
        self.replies.lock().unwrap().push_back(reply);
        self
    }

    /// Message contents of every call, joined per call
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }

    pub fn last_prompt(&self) -> Option<String> {
        self.prompts.lock().unwrap().last().cloned()
    }

    fn record(&self, messages: &[ChatMessage]) {
        let joined = messages
            .iter()
            .map(|m| m.content.as_str())
            .collect::<Vec<_>>()
            .join("\n");
        self.prompts.lock().unwrap().push(joined);
    }
}

#[async_trait]
impl ChatModel for ScriptedModel {
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String, LlmError> {
        self.record(messages);
        Err(LlmError::EmptyResponse)
    }

    async fn complete_json(&self, messages: &[ChatMessage], schema: &OutputSchema) -> Result<Value, LlmError> {
        self.record(messages);
        if self.failing.contains(schema.name) {
            return Err(LlmError::Api {
                status: 500,
                body: format!("scripted failure for {}", schema.name),
            });
        }
        self.json.get(schema.name).cloned().ok_or(LlmError::EmptyResponse)
    }

    async fn complete_with_tools(
        &self,
        messages: &[ChatMessage],
        _tools: &[ToolSpec],
    ) -> Result<ChatMessage, LlmError> {
        self.record(messages);
        self.replies.lock().unwrap().pop_front().ok_or(LlmError::EmptyResponse)
    }
}

/// `n` well-formed questions; option 0 is always the correct one
pub fn sample_mcq_list(n: usize) -> McqList {
    let raw = (1..=n)
        .map(|i| {
            let options: Vec<McqOption> = ["A", "B", "C", "D"]
                .iter()
                .enumerate()
                .map(|(j, label)| McqOption {
                    text: format!("Answer {}{}", label, i),
                    is_correct: j == 0,
                })
                .collect();
            McqQuestion {
                question: format!("Question {}?", i),
                question_description: format!("Narration for question {}", i),
                correct_answer: options[0].text.clone(),
                options,
                options_description: "Four choices".to_string(),
                correct_answer_description: "The first one".to_string(),
                explanation: format!("Explanation {}", i),
                explanation_description: format!("Narrated explanation {}", i),
            }
        })
        .collect();

    McqList { count: n, raw }
}

pub struct RecordingVideoCreator {
    video_id: Option<String>,
    requests: Mutex<Vec<CreateVideoRequest>>,
}

impl RecordingVideoCreator {
    pub fn new(video_id: &str) -> Self {
        Self {
            video_id: Some(video_id.to_string()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self {
            video_id: None,
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn requests(&self) -> Vec<CreateVideoRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl VideoCreator for RecordingVideoCreator {
    async fn create_video(&self, request: &CreateVideoRequest) -> Result<CreatedVideo, VideoApiError> {
        let Some(video_id) = self.video_id.clone() else {
            return Err(VideoApiError::Api {
                status: 500,
                body: "render queue unavailable".to_string(),
            });
        };

        self.requests.lock().unwrap().push(request.clone());
        Ok(CreatedVideo {
            video_url: format!("https://example.com/video/{}", video_id),
            video_id,
        })
    }
}

/// OCR engine that never touches external binaries
pub struct FakeOcrEngine {
    pages: Vec<String>,
    image_text: Option<String>,
    fail: bool,
    rasterize_calls: AtomicUsize,
}

impl FakeOcrEngine {
    fn build(pages: Vec<String>, image_text: Option<String>, fail: bool) -> Self {
        Self {
            pages,
            image_text,
            fail,
            rasterize_calls: AtomicUsize::new(0),
        }
    }

    pub fn with_pages(pages: &[&str]) -> Self {
        Self::build(pages.iter().map(|p| p.to_string()).collect(), None, false)
    }

    pub fn with_image_text(text: &str) -> Self {
        Self::build(Vec::new(), Some(text.to_string()), false)
    }

    pub fn failing() -> Self {
        Self::build(Vec::new(), None, true)
    }

    pub fn rasterize_calls(&self) -> usize {
        self.rasterize_calls.load(Ordering::SeqCst)
    }

    fn tool_error(tool: &'static str) -> OcrError {
        OcrError::Tool {
            tool,
            message: "scripted failure".to_string(),
        }
    }
}

#[async_trait]
impl OcrEngine for FakeOcrEngine {
    async fn rasterize_pdf(&self, _pdf: &Path, out_dir: &Path) -> Result<Vec<PathBuf>, OcrError> {
        self.rasterize_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(Self::tool_error("pdftoppm"));
        }
        Ok((0..self.pages.len())
            .map(|i| out_dir.join(format!("page-{}.png", i)))
            .collect())
    }

    async fn recognize_image(&self, image: &Path) -> Result<String, OcrError> {
        if self.fail {
            return Err(Self::tool_error("tesseract"));
        }

        let page = image
            .file_stem()
            .and_then(|s| s.to_str())
            .and_then(|s| s.strip_prefix("page-"))
            .and_then(|i| i.parse::<usize>().ok())
            .and_then(|i| self.pages.get(i));

        match (page, &self.image_text) {
            (Some(text), _) => Ok(text.clone()),
            (None, Some(text)) => Ok(text.clone()),
            (None, None) => Err(Self::tool_error("tesseract")),
        }
    }
}

/// Downloader that only invents local paths
pub struct FakeDownloader {
    failing: HashSet<String>,
}

impl FakeDownloader {
    pub fn ok() -> Self {
        Self {
            failing: HashSet::new(),
        }
    }

    pub fn failing_for(urls: &[&str]) -> Self {
        Self {
            failing: urls.iter().map(|u| u.to_string()).collect(),
        }
    }
}

#[async_trait]
impl AssetDownloader for FakeDownloader {
    async fn download(&self, url: &str, local_dir: &Path) -> Result<PathBuf, DownloadError> {
        if self.failing.contains(url) {
            return Err(DownloadError::Status {
                url: url.to_string(),
                status: 404,
            });
        }
        let name = url.rsplit('/').next().unwrap_or("download.bin");
        Ok(local_dir.join(name))
    }
}

pub struct FakeExtractor {
    text: String,
}

impl FakeExtractor {
    pub fn constant(text: &str) -> Self {
        Self { text: text.to_string() }
    }
}

#[async_trait]
impl TextExtractor for FakeExtractor {
    async fn extract_text(&self, _path: &Path) -> Result<String, OcrError> {
        Ok(self.text.clone())
    }
}

pub fn test_config() -> AppConfig {
    let vars: HashMap<&str, &str> = [
        ("LLM_API_KEY", "test-api-key"),
        ("VIDEO_API_BASE_URL", "https://test-api.example.com"),
        ("SERVER_API_KEY", "test-server-key"),
        ("MCQ_DEBUG_FILES", "false"),
    ]
    .into_iter()
    .collect();

    AppConfig::from_lookup(|key| vars.get(key).map(|v| v.to_string())).unwrap()
}

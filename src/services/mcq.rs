// src/services/mcq.rs
//! Documents in, quiz video out: download, OCR, generate questions, render.

use crate::config::{LlmConfig, McqConfig};
use crate::llm_client::{generate_structured, ChatMessage, ChatModel, LlmError};
use crate::models::api::{McqRequest, McqResponse};
use crate::models::McqList;
use crate::prompts::mcq_prompt;
use crate::services::ocr::TextExtractor;
use crate::services::s3::AssetDownloader;
use crate::tools::{VideoContent, VideoCreationTool, VideoToolInput};
use crate::video_client::VideoApiError;
use chrono::Local;
use serde_json::json;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, error, info, warn};

/// Characters of extracted text sent to the model
pub const MAX_DOCUMENT_CHARS: usize = 20_000;
pub const TRUNCATION_MARKER: &str = "...[truncated]";

const RULE: &str = "================================================================================";

#[derive(Error, Debug)]
pub enum McqError {
    #[error("Invalid project id: {0:?}")]
    InvalidProjectId(String),

    #[error("Failed to create {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Llm(#[from] LlmError),

    #[error(transparent)]
    Video(#[from] VideoApiError),
}

/// A project id names one directory directly under the MCQ storage root
pub fn validate_project_id(project_id: &str) -> Result<(), McqError> {
    let escapes = project_id.is_empty()
        || project_id.contains(['/', '\\'])
        || project_id.contains("..")
        || Path::new(project_id).is_absolute();
    if escapes {
        return Err(McqError::InvalidProjectId(project_id.to_string()));
    }
    Ok(())
}

pub fn truncate_document(text: &str) -> String {
    match text.char_indices().nth(MAX_DOCUMENT_CHARS) {
        Some((cut, _)) => format!("{}{}", &text[..cut], TRUNCATION_MARKER),
        None => text.to_string(),
    }
}

pub struct McqService {
    model: Arc<dyn ChatModel>,
    downloader: Arc<dyn AssetDownloader>,
    extractor: Arc<dyn TextExtractor>,
    video_tool: Arc<VideoCreationTool>,
    mcq_files_path: PathBuf,
    config: McqConfig,
    llm: LlmConfig,
}

impl McqService {
    pub fn new(
        model: Arc<dyn ChatModel>,
        downloader: Arc<dyn AssetDownloader>,
        extractor: Arc<dyn TextExtractor>,
        video_tool: Arc<VideoCreationTool>,
        mcq_files_path: impl Into<PathBuf>,
        config: McqConfig,
        llm: LlmConfig,
    ) -> Self {
        Self {
            model,
            downloader,
            extractor,
            video_tool,
            mcq_files_path: mcq_files_path.into(),
            config,
            llm,
        }
    }

    pub async fn process_request(&self, request: &McqRequest) -> Result<McqResponse, McqError> {
        validate_project_id(&request.project_id)?;
        let project_dir = self.mcq_files_path.join(&request.project_id);
        tokio::fs::create_dir_all(&project_dir)
            .await
            .map_err(|source| McqError::Io {
                path: project_dir.display().to_string(),
                source,
            })?;

        info!(
            project_id = %request.project_id,
            "📚 Processing {} asset files",
            request.asset_files.len()
        );

        let mut texts = Vec::new();
        let mut downloaded = 0;

        // One asset at a time; a bad file is logged and skipped
        for url in &request.asset_files {
            let local_path = match self.downloader.download(url, &project_dir).await {
                Ok(path) => path,
                Err(e) => {
                    error!("Error processing file {}: {}", url, e);
                    continue;
                }
            };
            downloaded += 1;

            match self.extractor.extract_text(&local_path).await {
                Ok(text) => {
                    info!("Successfully processed file: {}", url);
                    texts.push(text);
                }
                Err(e) => error!("Error processing file {}: {}", url, e),
            }
        }

        let combined = texts.join("\n\n");
        let mcqs = self
            .generate_mcqs(&request.project_id, &request.system_prompt, &combined, &request.user_prompt)
            .await?;

        info!(
            project_id = %request.project_id,
            questions = mcqs.raw.len(),
            "MCQ generation complete"
        );

        let video = self
            .video_tool
            .create(VideoToolInput {
                title: format!("MCQ Video - {}", request.project_id),
                desc: "Automatically generated multiple choice questions video".to_string(),
                thumbnail_text: "MCQ Quiz".to_string(),
                thumbnail_visual_desc: "Educational quiz thumbnail with question marks and colorful design"
                    .to_string(),
                content: VideoContent::Mcq(mcqs.raw.clone()),
                project_id: request.project_id.clone(),
            })
            .await?;

        info!(video_id = %video.video_id, "Video creation result: {}", video.message);

        Ok(McqResponse {
            project_id: request.project_id.clone(),
            mcqs,
            processed_files: downloaded,
        })
    }

    async fn generate_mcqs(
        &self,
        project_id: &str,
        system_prompt: &str,
        document_text: &str,
        user_prompt: &str,
    ) -> Result<McqList, McqError> {
        let document = truncate_document(document_text);
        let full_prompt = mcq_prompt(system_prompt, &document, user_prompt, self.config.question_count);

        info!("Generating MCQs using LLM (structured output)...");
        info!("Full prompt length: {} characters", full_prompt.chars().count());
        debug!("Full prompt content: {}...", full_prompt.chars().take(500).collect::<String>());

        let mcqs: McqList =
            generate_structured(self.model.as_ref(), &[ChatMessage::user(full_prompt.clone())]).await?;

        if self.config.write_debug_files {
            let debug_info = json!({
                "prompt_length": full_prompt.chars().count(),
                "document_text_length": document.chars().count(),
                "mcq_count_requested": self.config.question_count,
                "llm_provider": self.llm.provider,
                "llm_model": self.llm.model,
                "temperature": self.llm.temperature,
            });
            let debug_dir = self.mcq_files_path.join(project_id).join("debug");
            if let Err(e) = write_debug_files(&debug_dir, project_id, &full_prompt, &mcqs, &debug_info).await {
                // Debug output never fails the request
                warn!("Error writing debug files: {}", e);
            }
        }

        Ok(mcqs)
    }
}

async fn write_debug_files(
    debug_dir: &Path,
    project_id: &str,
    full_prompt: &str,
    response: &McqList,
    debug_info: &serde_json::Value,
) -> std::io::Result<()> {
    tokio::fs::create_dir_all(debug_dir).await?;

    let now = Local::now();
    let timestamp = now.format("%Y%m%d_%H%M%S").to_string();
    let iso = now.to_rfc3339();

    let prompt_file = debug_dir.join(format!("prompt_{}.txt", timestamp));
    let response_file = debug_dir.join(format!("response_{}.json", timestamp));
    let summary_file = debug_dir.join(format!("summary_{}.txt", timestamp));

    let prompt_body = format!(
        "{RULE}\nMCQ GENERATION PROMPT - {iso}\n{RULE}\n\n{full_prompt}\n\n{RULE}\nEND OF PROMPT\n{RULE}\n"
    );
    tokio::fs::write(&prompt_file, prompt_body).await?;

    let response_body = json!({
        "timestamp": iso,
        "response_type": "McqList",
        "response_content": response,
        "debug_info": debug_info,
    });
    let response_json = serde_json::to_string_pretty(&response_body)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
    tokio::fs::write(&response_file, response_json).await?;

    let mut summary = format!(
        "MCQ Generation Debug Summary - {iso}\n{}\n\n\
         Project ID: {project_id}\n\
         Prompt Length: {} characters\n\
         Response Type: McqList\n\
         Number of MCQs Generated: {}\n\
         \nFiles Generated:\n\
         - Prompt: {}\n\
         - Response: {}\n\
         - Summary: {}\n",
        "=".repeat(60),
        full_prompt.chars().count(),
        response.raw.len(),
        prompt_file.display(),
        response_file.display(),
        summary_file.display(),
    );
    if let Some(info) = debug_info.as_object() {
        summary.push_str("\nAdditional Debug Info:\n");
        for (key, value) in info {
            summary.push_str(&format!("- {}: {}\n", key, value));
        }
    }
    tokio::fs::write(&summary_file, summary).await?;

    info!("Debug files written to {}", debug_dir.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{
        sample_mcq_list, test_config, FakeDownloader, FakeExtractor, RecordingVideoCreator, ScriptedModel,
    };
    use crate::video_client::VideoType;

    struct Harness {
        service: McqService,
        model: Arc<ScriptedModel>,
        creator: Arc<RecordingVideoCreator>,
        _dir: tempfile::TempDir,
        root: PathBuf,
    }

    fn harness(downloader: FakeDownloader, extractor: FakeExtractor, debug: bool) -> Harness {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().to_path_buf();
        let config = test_config();
        let model = Arc::new(ScriptedModel::new().with_json("mcq_list", json!(sample_mcq_list(20))));
        let creator = Arc::new(RecordingVideoCreator::new("quiz1"));

        let service = McqService::new(
            model.clone(),
            Arc::new(downloader),
            Arc::new(extractor),
            Arc::new(VideoCreationTool::new(creator.clone())),
            &root,
            McqConfig {
                question_count: 20,
                write_debug_files: debug,
            },
            config.llm,
        );

        Harness {
            service,
            model,
            creator,
            _dir: dir,
            root,
        }
    }

    fn request(files: &[&str]) -> McqRequest {
        McqRequest {
            project_id: "proj1".to_string(),
            system_prompt: "Generate MCQs".to_string(),
            asset_files: files.iter().map(|f| f.to_string()).collect(),
            user_prompt: "Create questions about testing".to_string(),
        }
    }

    #[test]
    fn test_truncation() {
        let short = "a".repeat(MAX_DOCUMENT_CHARS);
        assert_eq!(truncate_document(&short), short);

        let long = "é".repeat(MAX_DOCUMENT_CHARS + 5);
        let cut = truncate_document(&long);
        assert!(cut.ends_with(TRUNCATION_MARKER));
        assert_eq!(cut.chars().count(), MAX_DOCUMENT_CHARS + TRUNCATION_MARKER.len());
    }

    #[test]
    fn test_project_id_validation() {
        for ok in ["proj1", "course-42_v2", "a.b"] {
            assert!(validate_project_id(ok).is_ok(), "{} should be accepted", ok);
        }
        for bad in ["", "..", "../outside", "nested/dir", "win\\dir", "/tmp/escaped", "a..b"] {
            assert!(
                matches!(validate_project_id(bad), Err(McqError::InvalidProjectId(_))),
                "{:?} should be rejected",
                bad
            );
        }
    }

    #[tokio::test]
    async fn test_project_id_outside_root_rejected_before_io() {
        let h = harness(FakeDownloader::ok(), FakeExtractor::constant("text"), true);
        let outside = tempfile::tempdir().unwrap();
        let escaped = outside.path().join("escaped");

        for project_id in [escaped.display().to_string(), "../escaped".to_string()] {
            let mut req = request(&["https://bucket/doc.pdf"]);
            req.project_id = project_id;
            let err = h.service.process_request(&req).await.unwrap_err();
            assert!(matches!(err, McqError::InvalidProjectId(_)));
        }

        assert!(!escaped.exists());
        assert!(!h.root.parent().unwrap().join("escaped").exists());
        assert_eq!(std::fs::read_dir(&h.root).unwrap().count(), 0);
        assert!(h.model.prompts().is_empty());
        assert!(h.creator.requests().is_empty());
    }

    #[tokio::test]
    async fn test_end_to_end_prompt_and_video() {
        let h = harness(
            FakeDownloader::ok(),
            FakeExtractor::constant("Sample extracted text"),
            false,
        );

        let response = h
            .service
            .process_request(&request(&["https://bucket/doc.pdf"]))
            .await
            .unwrap();

        assert_eq!(response.project_id, "proj1");
        assert_eq!(response.processed_files, 1);
        assert_eq!(response.mcqs.raw.len(), 20);

        let prompt = h.model.last_prompt().unwrap();
        assert!(prompt.contains("Sample extracted text"));
        assert!(prompt.contains("Generate MCQs"));
        assert!(prompt.contains("Create questions about testing"));
        assert!(prompt.contains("Generate exactly 20 multiple choice questions"));

        let sent = h.creator.requests();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].video_type, VideoType::Mcq);
        assert_eq!(sent[0].name, "MCQ Video - proj1");
        assert_eq!(sent[0].raw.as_array().unwrap().len(), 20);
        assert!(h.root.join("proj1").is_dir());
    }

    #[tokio::test]
    async fn test_failed_assets_are_skipped() {
        let h = harness(
            FakeDownloader::failing_for(&["https://bucket/broken.pdf"]),
            FakeExtractor::constant("good text"),
            false,
        );

        let response = h
            .service
            .process_request(&request(&["https://bucket/broken.pdf", "https://bucket/ok.pdf"]))
            .await
            .unwrap();

        assert_eq!(response.processed_files, 1);
        assert!(h.model.last_prompt().unwrap().contains("good text"));
    }

    #[tokio::test]
    async fn test_no_assets_still_generates() {
        let h = harness(FakeDownloader::ok(), FakeExtractor::constant("unused"), false);
        let response = h.service.process_request(&request(&[])).await.unwrap();
        assert_eq!(response.processed_files, 0);
        assert!(!h.model.last_prompt().unwrap().contains("unused"));
    }

    #[tokio::test]
    async fn test_debug_files_written() {
        let h = harness(FakeDownloader::ok(), FakeExtractor::constant("text"), true);
        h.service
            .process_request(&request(&["https://bucket/a.txt"]))
            .await
            .unwrap();

        let debug_dir = h.root.join("proj1").join("debug");
        let names: Vec<String> = std::fs::read_dir(&debug_dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names.len(), 3);
        for prefix in ["prompt_", "response_", "summary_"] {
            assert!(names.iter().any(|n| n.starts_with(prefix)), "missing {}", prefix);
        }
    }

    #[tokio::test]
    async fn test_invalid_mcqs_propagate() {
        let h = harness(FakeDownloader::ok(), FakeExtractor::constant("text"), false);
        let mut bad = sample_mcq_list(20);
        bad.raw[0].options[1].is_correct = true;
        let model = Arc::new(ScriptedModel::new().with_json("mcq_list", json!(bad)));
        let service = McqService::new(
            model,
            Arc::new(FakeDownloader::ok()),
            Arc::new(FakeExtractor::constant("text")),
            Arc::new(VideoCreationTool::new(h.creator.clone())),
            &h.root,
            McqConfig {
                question_count: 20,
                write_debug_files: false,
            },
            test_config().llm,
        );

        let err = service.process_request(&request(&[])).await.unwrap_err();
        assert!(matches!(err, McqError::Llm(LlmError::Validation(_))));
        assert!(h.creator.requests().is_empty());
    }

    #[tokio::test]
    async fn test_video_failure_propagates() {
        let dir = tempfile::tempdir().unwrap();
        let service = McqService::new(
            Arc::new(ScriptedModel::new().with_json("mcq_list", json!(sample_mcq_list(20)))),
            Arc::new(FakeDownloader::ok()),
            Arc::new(FakeExtractor::constant("text")),
            Arc::new(VideoCreationTool::new(Arc::new(RecordingVideoCreator::failing()))),
            dir.path(),
            McqConfig {
                question_count: 20,
                write_debug_files: false,
            },
            test_config().llm,
        );

        let err = service.process_request(&request(&[])).await.unwrap_err();
        assert!(matches!(err, McqError::Video(_)));
    }
}

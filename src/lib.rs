// lib.rs - Application state, router and the modules behind them
pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod llm_client;
pub mod middleware;
pub mod models;
pub mod openai_client;
pub mod prompts;
pub mod services;
pub mod tools;
pub mod topics;
pub mod video_client;
pub mod workflow;

#[cfg(test)]
mod test_support;

use axum::{Extension, Router};
use config::{AppConfig, ConfigError};
use llm_client::{ChatModel, LlmError};
use openai_client::OpenAiClient;
use services::{AssetDownloader, McqService, OcrService, S3Service, TesseractEngine, TextExtractor};
use std::sync::Arc;
use thiserror::Error;
use tools::{HumanAssistanceTool, ToolRegistry, VideoCreationTool};
use tower_http::cors::CorsLayer;
use video_client::{VideoCreator, VideoHttpClient};
use workflow::chat::ChatWorkflow;
use workflow::checkpoint::{CheckpointError, CheckpointStore, MemoryCheckpointer, PgCheckpointer};
use workflow::graph::GraphError;
use workflow::quote_video::QuoteVideoWorkflow;

#[derive(Error, Debug)]
pub enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Llm(#[from] LlmError),

    #[error("Database connection failed: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Checkpoint store setup failed: {0}")]
    Checkpoint(#[from] CheckpointError),

    #[error("Invalid workflow graph: {0}")]
    Graph(#[from] GraphError),

    #[error("Failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Server error: {0}")]
    Serve(std::io::Error),
}

/// Everything the handlers need, built once at startup
pub struct AppState {
    pub config: AppConfig,
    pub quote_workflow: QuoteVideoWorkflow,
    pub chat_workflow: ChatWorkflow,
    pub mcq_service: McqService,
}

impl AppState {
    pub fn new(
        config: AppConfig,
        model: Arc<dyn ChatModel>,
        video_creator: Arc<dyn VideoCreator>,
        downloader: Arc<dyn AssetDownloader>,
        extractor: Arc<dyn TextExtractor>,
        checkpointer: Arc<dyn CheckpointStore>,
    ) -> Result<Self, GraphError> {
        let video_tool = Arc::new(VideoCreationTool::new(video_creator));
        let tools = ToolRegistry::new()
            .register(video_tool.clone())
            .register(Arc::new(HumanAssistanceTool));

        let quote_workflow = QuoteVideoWorkflow::new(model.clone(), video_tool.clone(), checkpointer.clone())?;
        let chat_workflow = ChatWorkflow::new(model.clone(), tools, checkpointer)?;
        let mcq_service = McqService::new(
            model,
            downloader,
            extractor,
            video_tool,
            config.storage.mcq_files_path.clone(),
            config.mcq.clone(),
            config.llm.clone(),
        );

        Ok(Self {
            config,
            quote_workflow,
            chat_workflow,
            mcq_service,
        })
    }

    /// Wire the production clients described by `config`
    pub async fn from_config(config: AppConfig) -> Result<Self, StartupError> {
        let model: Arc<dyn ChatModel> = Arc::new(OpenAiClient::from_config(&config.llm)?);
        let video_creator: Arc<dyn VideoCreator> = Arc::new(VideoHttpClient::new(&config.video_api));
        let downloader: Arc<dyn AssetDownloader> = Arc::new(S3Service::new(config.storage.clone()));
        let extractor: Arc<dyn TextExtractor> = Arc::new(OcrService::new(Arc::new(TesseractEngine::new())));

        let checkpointer: Arc<dyn CheckpointStore> = match config.database_url.as_deref() {
            Some(url) => {
                let store = PgCheckpointer::new(db::create_pool(url).await?);
                store.setup().await?;
                tracing::info!("💾 Workflow checkpoints stored in PostgreSQL");
                Arc::new(store)
            }
            None => {
                tracing::warn!("DATABASE_URL not set - workflow checkpoints kept in memory");
                Arc::new(MemoryCheckpointer::new())
            }
        };

        Ok(Self::new(config, model, video_creator, downloader, extractor, checkpointer)?)
    }
}

pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .merge(handlers::health::health_routes())
        .merge(handlers::graph::graph_routes())
        .merge(handlers::mcq::mcq_routes())
        .merge(handlers::conversation::conversation_routes())
        .merge(handlers::chat::chat_routes())
        .layer(axum::middleware::from_fn(middleware::logging::request_logging_middleware))
        .layer(CorsLayer::permissive())
        .layer(Extension(state))
}

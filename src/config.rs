// src/config.rs
//! Environment-driven configuration, read once at startup.

use crate::models::mcq::{MAX_QUESTIONS, MIN_QUESTIONS};
use std::env;
use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),
    #[error("Invalid value for {name}: {value}")]
    Invalid { name: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub provider: String,
    pub model: String,
    pub api_key: String,
    pub temperature: f32,
    pub base_url: String,
}

#[derive(Debug, Clone)]
pub struct VideoApiConfig {
    pub base_url: String,
    pub api_key: String,
    /// Prefix used to build the public `video_url` returned to callers
    pub public_base_url: String,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind_addr: String,
    pub api_key: String,
}

#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub temp_file_path: String,
    pub mcq_files_path: String,
    pub aws_access_key: Option<String>,
    pub aws_secret_key: Option<String>,
    pub aws_region: String,
}

#[derive(Debug, Clone)]
pub struct McqConfig {
    pub question_count: usize,
    pub write_debug_files: bool,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub llm: LlmConfig,
    pub video_api: VideoApiConfig,
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub mcq: McqConfig,
    /// PostgreSQL URL for workflow checkpoints; in-memory store when unset
    pub database_url: Option<String>,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup (the process
    /// environment in production, a map in tests).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let require = |key: &'static str| get(key).ok_or(ConfigError::Missing(key));

        let temperature = match get("LLM_TEMPERATURE") {
            Some(raw) => raw.parse::<f32>().map_err(|_| ConfigError::Invalid {
                name: "LLM_TEMPERATURE",
                value: raw.clone(),
            })?,
            None => 0.7,
        };

        let question_count = match get("MCQ_QUESTION_COUNT") {
            Some(raw) => match raw.parse::<usize>() {
                Ok(n) if (MIN_QUESTIONS..=MAX_QUESTIONS).contains(&n) => n,
                _ => {
                    return Err(ConfigError::Invalid {
                        name: "MCQ_QUESTION_COUNT",
                        value: raw,
                    })
                }
            },
            None => MIN_QUESTIONS,
        };

        let write_debug_files = match get("MCQ_DEBUG_FILES").as_deref() {
            None => true,
            Some("1") | Some("true") | Some("yes") => true,
            Some("0") | Some("false") | Some("no") => false,
            Some(other) => {
                return Err(ConfigError::Invalid {
                    name: "MCQ_DEBUG_FILES",
                    value: other.to_string(),
                })
            }
        };

        Ok(Self {
            llm: LlmConfig {
                provider: get("LLM_PROVIDER").unwrap_or_else(|| "openai".to_string()),
                model: get("LLM_MODEL").unwrap_or_else(|| "gpt-4.1-mini".to_string()),
                api_key: require("LLM_API_KEY")?,
                temperature,
                base_url: get("LLM_BASE_URL")
                    .unwrap_or_else(|| "https://api.openai.com/v1".to_string()),
            },
            video_api: VideoApiConfig {
                base_url: require("VIDEO_API_BASE_URL")?,
                api_key: get("VIDEO_API_KEY").unwrap_or_default(),
                public_base_url: get("VIDEO_PUBLIC_BASE_URL")
                    .unwrap_or_else(|| "https://example.com".to_string()),
            },
            server: ServerConfig {
                bind_addr: get("BIND_ADDR").unwrap_or_else(|| "0.0.0.0:8000".to_string()),
                api_key: require("SERVER_API_KEY")?,
            },
            storage: StorageConfig {
                temp_file_path: get("TEMP_FILE_PATH").unwrap_or_else(|| "temp".to_string()),
                mcq_files_path: get("MCQ_FILES_PATH").unwrap_or_else(|| "mcq_files".to_string()),
                aws_access_key: get("AWS_ACCESS_KEY"),
                aws_secret_key: get("AWS_SECRET_KEY"),
                aws_region: get("AWS_REGION").unwrap_or_else(|| "us-east-1".to_string()),
            },
            mcq: McqConfig {
                question_count,
                write_debug_files,
            },
            database_url: get("DATABASE_URL"),
        })
    }
}

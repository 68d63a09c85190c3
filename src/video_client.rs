// src/video_client.rs
use crate::config::VideoApiConfig;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::{error, info};

#[derive(Error, Debug)]
pub enum VideoApiError {
    #[error("Video API request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Video API returned {status}: {body}")]
    Api { status: u16, body: String },

    #[error("Video API response has no id: {0}")]
    MissingId(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VideoType {
    Message,
    Mcq,
}

impl std::fmt::Display for VideoType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VideoType::Message => write!(f, "message"),
            VideoType::Mcq => write!(f, "mcq"),
        }
    }
}

/// Body of `POST /videos/create-with-scenes`
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateVideoRequest {
    pub project_id: String,
    pub name: String,
    pub description: String,
    pub visual_prompt: String,
    pub raw: Value,
    pub video_type: VideoType,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CreatedVideo {
    pub video_id: String,
    pub video_url: String,
}

#[derive(Debug, Deserialize)]
struct CreateVideoResponse {
    id: Option<Value>,
}

#[async_trait]
pub trait VideoCreator: Send + Sync {
    async fn create_video(&self, request: &CreateVideoRequest) -> Result<CreatedVideo, VideoApiError>;
}

#[derive(Debug, Clone)]
pub struct VideoHttpClient {
    client: Client,
    base_url: String,
    api_key: String,
    public_base_url: String,
}

impl VideoHttpClient {
    pub fn new(config: &VideoApiConfig) -> Self {
        Self {
            client: Client::new(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            public_base_url: config.public_base_url.trim_end_matches('/').to_string(),
        }
    }

    fn video_url(&self, video_id: &str) -> String {
        format!("{}/video/{}", self.public_base_url, video_id)
    }
}

#[async_trait]
impl VideoCreator for VideoHttpClient {
    async fn create_video(&self, request: &CreateVideoRequest) -> Result<CreatedVideo, VideoApiError> {
        let url = format!("{}/videos/create-with-scenes", self.base_url);

        info!(
            project_id = %request.project_id,
            video_type = %request.video_type,
            "🎬 Creating video: {}",
            request.name
        );

        let response = self
            .client
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .json(request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!("Video API error {}: {}", status, body);
            return Err(VideoApiError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let body = response.text().await?;
        let parsed: CreateVideoResponse =
            serde_json::from_str(&body).map_err(|_| VideoApiError::MissingId(body.clone()))?;

        // Ids may come back as strings or numbers
        let video_id = match parsed.id {
            Some(Value::String(id)) if !id.is_empty() => id,
            Some(Value::Number(id)) => id.to_string(),
            _ => return Err(VideoApiError::MissingId(body)),
        };

        info!("✅ Video created: {}", video_id);

        Ok(CreatedVideo {
            video_url: self.video_url(&video_id),
            video_id,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;
    use serde_json::json;

    fn client_for(server: &mockito::ServerGuard) -> VideoHttpClient {
        VideoHttpClient::new(&VideoApiConfig {
            base_url: server.url(),
            api_key: "secret-key".to_string(),
            public_base_url: "https://example.com".to_string(),
        })
    }

    fn request() -> CreateVideoRequest {
        CreateVideoRequest {
            project_id: "p1".to_string(),
            name: "Rise Again".to_string(),
            description: "A video about resilience".to_string(),
            visual_prompt: "sunrise over mountains".to_string(),
            raw: json!(["quote one", "quote two"]),
            video_type: VideoType::Message,
        }
    }

    #[tokio::test]
    async fn test_create_video_sends_contract_body() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/videos/create-with-scenes")
            .match_query(Matcher::UrlEncoded("key".into(), "secret-key".into()))
            .match_body(Matcher::Json(json!({
                "projectId": "p1",
                "name": "Rise Again",
                "description": "A video about resilience",
                "visualPrompt": "sunrise over mountains",
                "raw": ["quote one", "quote two"],
                "videoType": "message",
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"id":"video123"}"#)
            .create_async()
            .await;

        let created = client_for(&server).create_video(&request()).await.unwrap();
        mock.assert_async().await;
        assert_eq!(created.video_id, "video123");
        assert_eq!(created.video_url, "https://example.com/video/video123");
    }

    #[tokio::test]
    async fn test_numeric_id_accepted() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/videos/create-with-scenes")
            .match_query(Matcher::Any)
            .with_status(201)
            .with_body(r#"{"id":42}"#)
            .create_async()
            .await;

        let created = client_for(&server).create_video(&request()).await.unwrap();
        assert_eq!(created.video_id, "42");
    }

    #[tokio::test]
    async fn test_missing_id_is_an_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/videos/create-with-scenes")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(r#"{"status":"queued"}"#)
            .create_async()
            .await;

        let err = client_for(&server).create_video(&request()).await.unwrap_err();
        assert!(matches!(err, VideoApiError::MissingId(_)));
    }

    #[tokio::test]
    async fn test_non_success_status_is_not_retried() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/videos/create-with-scenes")
            .match_query(Matcher::Any)
            .with_status(502)
            .with_body("bad gateway")
            .expect(1)
            .create_async()
            .await;

        let err = client_for(&server).create_video(&request()).await.unwrap_err();
        mock.assert_async().await;
        assert!(matches!(err, VideoApiError::Api { status: 502, .. }));
    }
}

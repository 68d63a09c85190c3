// src/services/s3.rs
//! Public-URL downloads and S3 uploads for MCQ source assets.

use crate::config::StorageConfig;
use async_trait::async_trait;
use aws_sdk_s3::config::{BehaviorVersion, Credentials, Region};
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::primitives::ByteStream;
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::fs::File;
use tokio::io::{AsyncWriteExt, BufWriter};
use tracing::{error, info};
use url::Url;
use uuid::Uuid;

const WRITE_BUFFER_SIZE: usize = 8192;

#[derive(Error, Debug)]
pub enum DownloadError {
    #[error("Invalid URL {url}: {message}")]
    InvalidUrl { url: String, message: String },

    #[error("Download request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Download of {url} returned status {status}")]
    Status { url: String, status: u16 },

    #[error("Failed to write {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Error, Debug)]
pub enum UploadError {
    #[error("AWS credentials are not configured")]
    MissingCredentials,

    #[error("Failed to read {path}: {message}")]
    Read { path: String, message: String },

    #[error("S3 upload failed: {0}")]
    S3(String),
}

/// Fetches a remote asset into a local directory
#[async_trait]
pub trait AssetDownloader: Send + Sync {
    async fn download(&self, url: &str, local_dir: &Path) -> Result<PathBuf, DownloadError>;
}

/// Last path segment of the URL, unless it is empty or has no extension
fn filename_from_url(url: &Url) -> Option<String> {
    let name = url.path().rsplit('/').next().unwrap_or_default();
    if name.is_empty() || !name.contains('.') {
        return None;
    }
    Some(name.to_string())
}

/// Extension (with dot) for a nameless download
fn guess_extension(content_type: &str, url_path: &str) -> &'static str {
    let content_type = content_type.to_ascii_lowercase();

    if content_type.contains("pdf") {
        return ".pdf";
    } else if content_type.contains("image/jpeg") || content_type.contains("image/jpg") {
        return ".jpg";
    } else if content_type.contains("image/png") {
        return ".png";
    } else if content_type.contains("text/plain") {
        return ".txt";
    } else if content_type.contains("application/msword") {
        return ".doc";
    } else if content_type
        .contains("application/vnd.openxmlformats-officedocument.wordprocessingml.document")
    {
        return ".docx";
    }

    let path = url_path.to_ascii_lowercase();
    if path.ends_with(".pdf") {
        ".pdf"
    } else if path.ends_with(".jpg") || path.ends_with(".jpeg") {
        ".jpg"
    } else if path.ends_with(".png") {
        ".png"
    } else if path.ends_with(".txt") {
        ".txt"
    } else if path.ends_with(".doc") {
        ".doc"
    } else if path.ends_with(".docx") {
        ".docx"
    } else {
        ".bin"
    }
}

pub fn default_key(local_path: &Path) -> String {
    local_path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

pub fn s3_object_url(bucket: &str, key: &str) -> String {
    format!("https://{}.s3.amazonaws.com/{}", bucket, key)
}

#[derive(Debug, Clone)]
pub struct S3Service {
    client: Client,
    storage: StorageConfig,
}

impl S3Service {
    pub fn new(storage: StorageConfig) -> Self {
        Self {
            client: Client::new(),
            storage,
        }
    }

    /// Stream `url` into `local_dir` (the temp dir when `None`) and return the local path
    pub async fn download_from_public_url(
        &self,
        url: &str,
        local_dir: Option<&Path>,
    ) -> Result<PathBuf, DownloadError> {
        let local_dir = local_dir
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from(&self.storage.temp_file_path));

        tokio::fs::create_dir_all(&local_dir)
            .await
            .map_err(|source| DownloadError::Io {
                path: local_dir.display().to_string(),
                source,
            })?;

        let parsed = Url::parse(url).map_err(|e| DownloadError::InvalidUrl {
            url: url.to_string(),
            message: e.to_string(),
        })?;

        info!("📥 Downloading file from {}", url);

        let mut response = self.client.get(parsed.clone()).send().await.map_err(|e| {
            error!("Error downloading file from {}: {}", url, e);
            e
        })?;

        let status = response.status();
        if !status.is_success() {
            error!("Error downloading file from {}: status {}", url, status);
            return Err(DownloadError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let filename = filename_from_url(&parsed).unwrap_or_else(|| {
            let content_type = response
                .headers()
                .get(CONTENT_TYPE)
                .and_then(|v| v.to_str().ok())
                .unwrap_or_default();
            format!("{}{}", Uuid::new_v4(), guess_extension(content_type, parsed.path()))
        });
        let local_path = local_dir.join(filename);

        let io_err = |source| DownloadError::Io {
            path: local_path.display().to_string(),
            source,
        };

        let file = File::create(&local_path).await.map_err(io_err)?;
        let mut writer = BufWriter::with_capacity(WRITE_BUFFER_SIZE, file);

        while let Some(chunk) = response.chunk().await? {
            writer.write_all(&chunk).await.map_err(io_err)?;
        }
        writer.flush().await.map_err(io_err)?;

        info!("✅ File downloaded successfully to {}", local_path.display());
        Ok(local_path)
    }

    /// Upload a local file; the key defaults to the file name
    pub async fn upload_to_s3(
        &self,
        local_path: &Path,
        bucket: &str,
        key: Option<&str>,
    ) -> Result<String, UploadError> {
        let (Some(access_key), Some(secret_key)) = (
            self.storage.aws_access_key.as_ref(),
            self.storage.aws_secret_key.as_ref(),
        ) else {
            return Err(UploadError::MissingCredentials);
        };

        let key = key
            .map(str::to_string)
            .unwrap_or_else(|| default_key(local_path));

        let credentials = Credentials::new(access_key, secret_key, None, None, "static");
        let config = aws_sdk_s3::Config::builder()
            .behavior_version(BehaviorVersion::latest())
            .region(Region::new(self.storage.aws_region.clone()))
            .credentials_provider(credentials)
            .build();
        let client = aws_sdk_s3::Client::from_conf(config);

        let body = ByteStream::from_path(local_path)
            .await
            .map_err(|e| UploadError::Read {
                path: local_path.display().to_string(),
                message: e.to_string(),
            })?;

        client
            .put_object()
            .bucket(bucket)
            .key(&key)
            .body(body)
            .send()
            .await
            .map_err(|e| {
                error!("Error uploading file to S3: {}", DisplayErrorContext(&e));
                UploadError::S3(DisplayErrorContext(&e).to_string())
            })?;

        info!(bucket, key = %key, "☁️ Uploaded {}", local_path.display());
        Ok(s3_object_url(bucket, &key))
    }
}

#[async_trait]
impl AssetDownloader for S3Service {
    async fn download(&self, url: &str, local_dir: &Path) -> Result<PathBuf, DownloadError> {
        self.download_from_public_url(url, Some(local_dir)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn storage(temp: &Path) -> StorageConfig {
        StorageConfig {
            temp_file_path: temp.display().to_string(),
            mcq_files_path: temp.display().to_string(),
            aws_access_key: None,
            aws_secret_key: None,
            aws_region: "us-east-1".to_string(),
        }
    }

    #[test]
    fn test_guess_extension_prefers_content_type() {
        assert_eq!(guess_extension("application/pdf", "/x"), ".pdf");
        assert_eq!(guess_extension("image/JPEG", "/x"), ".jpg");
        assert_eq!(guess_extension("image/png", "/x"), ".png");
        assert_eq!(guess_extension("text/plain; charset=utf-8", "/x"), ".txt");
        assert_eq!(guess_extension("application/msword", "/x"), ".doc");
        assert_eq!(
            guess_extension(
                "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
                "/x"
            ),
            ".docx"
        );
    }

    #[test]
    fn test_guess_extension_falls_back_to_path_then_bin() {
        assert_eq!(guess_extension("application/octet-stream", "/files/scan.JPEG"), ".jpg");
        assert_eq!(guess_extension("", "/files/report.docx"), ".docx");
        assert_eq!(guess_extension("", "/files/blob"), ".bin");
    }

    #[test]
    fn test_filename_from_url() {
        let url = Url::parse("https://bucket.s3.amazonaws.com/docs/report.pdf?sig=1").unwrap();
        assert_eq!(filename_from_url(&url).as_deref(), Some("report.pdf"));
        let url = Url::parse("https://host/docs/").unwrap();
        assert!(filename_from_url(&url).is_none());
        let url = Url::parse("https://host/download").unwrap();
        assert!(filename_from_url(&url).is_none());
    }

    #[test]
    fn test_upload_url_and_default_key() {
        assert_eq!(default_key(Path::new("/tmp/out/quiz.mp4")), "quiz.mp4");
        assert_eq!(
            s3_object_url("my-bucket", "quiz.mp4"),
            "https://my-bucket.s3.amazonaws.com/quiz.mp4"
        );
    }

    #[tokio::test]
    async fn test_download_keeps_url_filename() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/assets/notes.txt")
            .with_status(200)
            .with_body("Sample extracted text")
            .create_async()
            .await;

        let dir = tempfile::tempdir().unwrap();
        let service = S3Service::new(storage(dir.path()));
        let path = service
            .download_from_public_url(&format!("{}/assets/notes.txt", server.url()), Some(dir.path()))
            .await
            .unwrap();

        assert_eq!(path, dir.path().join("notes.txt"));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "Sample extracted text");
    }

    #[tokio::test]
    async fn test_download_synthesizes_name_from_content_type() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/download")
            .with_status(200)
            .with_header("content-type", "application/pdf")
            .with_body("%PDF-1.4")
            .create_async()
            .await;

        let dir = tempfile::tempdir().unwrap();
        let service = S3Service::new(storage(dir.path()));
        let path = service
            .download_from_public_url(&format!("{}/download", server.url()), None)
            .await
            .unwrap();

        let name = path.file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.ends_with(".pdf"));
        assert_eq!(name.len(), 36 + 4);
        assert_eq!(path.parent().unwrap(), dir.path());
    }

    #[tokio::test]
    async fn test_download_error_status() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/missing.pdf")
            .with_status(404)
            .create_async()
            .await;

        let dir = tempfile::tempdir().unwrap();
        let service = S3Service::new(storage(dir.path()));
        let err = service
            .download_from_public_url(&format!("{}/missing.pdf", server.url()), Some(dir.path()))
            .await
            .unwrap_err();
        assert!(matches!(err, DownloadError::Status { status: 404, .. }));
    }

    #[tokio::test]
    async fn test_upload_requires_credentials() {
        let dir = tempfile::tempdir().unwrap();
        let service = S3Service::new(storage(dir.path()));
        let err = service
            .upload_to_s3(Path::new("/tmp/whatever.txt"), "bucket", None)
            .await
            .unwrap_err();
        assert!(matches!(err, UploadError::MissingCredentials));
    }
}

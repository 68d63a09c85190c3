// OCR service - text extraction from PDFs, images and plain files
// Calls pdftoppm and tesseract executables directly

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;
use thiserror::Error;
use tokio::process::Command;
use tracing::{error, info};

#[derive(Error, Debug)]
pub enum OcrError {
    #[error("Unsupported file format: {0}")]
    UnsupportedFormat(String),

    #[error("Failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{tool} failed: {message}")]
    Tool { tool: &'static str, message: String },
}

const IMAGE_EXTENSIONS: [&str; 6] = ["jpg", "jpeg", "png", "bmp", "tiff", "tif"];

/// Input kinds recognized by extension
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentKind {
    Pdf,
    Image,
    /// Anything else; holds the lowercased extension with its dot (may be empty)
    Other(String),
}

impl DocumentKind {
    pub fn from_path(path: &Path) -> Self {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .unwrap_or_default();

        match ext.as_str() {
            "pdf" => DocumentKind::Pdf,
            e if IMAGE_EXTENSIONS.contains(&e) => DocumentKind::Image,
            "" => DocumentKind::Other(String::new()),
            e => DocumentKind::Other(format!(".{}", e)),
        }
    }
}

/// Raw OCR primitives
#[async_trait]
pub trait OcrEngine: Send + Sync {
    /// Render each page of `pdf` as an image in `out_dir`, in page order
    async fn rasterize_pdf(&self, pdf: &Path, out_dir: &Path) -> Result<Vec<PathBuf>, OcrError>;

    async fn recognize_image(&self, image: &Path) -> Result<String, OcrError>;
}

/// Anything that turns a local file into text
#[async_trait]
pub trait TextExtractor: Send + Sync {
    async fn extract_text(&self, path: &Path) -> Result<String, OcrError>;
}

pub struct TesseractEngine {
    language: String,
    dpi: u32,
}

impl Default for TesseractEngine {
    fn default() -> Self {
        Self {
            language: "eng".to_string(),
            dpi: 200,
        }
    }
}

impl TesseractEngine {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl OcrEngine for TesseractEngine {
    async fn rasterize_pdf(&self, pdf: &Path, out_dir: &Path) -> Result<Vec<PathBuf>, OcrError> {
        let prefix = out_dir.join("page");

        let output = Command::new("pdftoppm")
            .arg("-png")
            .arg("-r")
            .arg(self.dpi.to_string())
            .arg(pdf)
            .arg(&prefix)
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| OcrError::Tool {
                tool: "pdftoppm",
                message: format!("{}. Make sure poppler-utils is installed.", e),
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            error!("pdftoppm error: {}", stderr);
            return Err(OcrError::Tool {
                tool: "pdftoppm",
                message: stderr.to_string(),
            });
        }

        let mut entries = tokio::fs::read_dir(out_dir).await.map_err(|source| OcrError::Io {
            path: out_dir.display().to_string(),
            source,
        })?;

        let mut pages = Vec::new();
        while let Ok(Some(entry)) = entries.next_entry().await {
            let path = entry.path();
            if path.extension().is_some_and(|e| e == "png") {
                pages.push(path);
            }
        }

        // pdftoppm zero-pads page numbers to a common width, so names sort in page order
        pages.sort();
        Ok(pages)
    }

    async fn recognize_image(&self, image: &Path) -> Result<String, OcrError> {
        let output = Command::new("tesseract")
            .arg(image)
            .arg("stdout")
            .arg("-l")
            .arg(&self.language)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| OcrError::Tool {
                tool: "tesseract",
                message: format!("{}. Make sure tesseract is installed.", e),
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(OcrError::Tool {
                tool: "tesseract",
                message: stderr.to_string(),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

pub struct OcrService {
    engine: Arc<dyn OcrEngine>,
}

impl OcrService {
    pub fn new(engine: Arc<dyn OcrEngine>) -> Self {
        Self { engine }
    }

    async fn extract_pdf(&self, path: &Path) -> Result<String, OcrError> {
        info!("Processing PDF: {}", path.display());

        let pages_dir = tempfile::tempdir().map_err(|source| OcrError::Io {
            path: "temporary directory".to_string(),
            source,
        })?;
        let pages = self.engine.rasterize_pdf(path, pages_dir.path()).await?;

        let mut texts = Vec::with_capacity(pages.len());
        for (i, page) in pages.iter().enumerate() {
            info!("Processing page {}/{}", i + 1, pages.len());
            texts.push(self.engine.recognize_image(page).await?);
        }

        let full_text = texts.join("\n\n");
        info!("PDF processing complete: extracted {} characters", full_text.len());
        Ok(full_text)
    }

    async fn extract_image(&self, path: &Path) -> Result<String, OcrError> {
        info!("Processing image: {}", path.display());
        let text = self.engine.recognize_image(path).await?;
        info!("Image processing complete: extracted {} characters", text.len());
        Ok(text)
    }
}

#[async_trait]
impl TextExtractor for OcrService {
    async fn extract_text(&self, path: &Path) -> Result<String, OcrError> {
        match DocumentKind::from_path(path) {
            DocumentKind::Pdf => self.extract_pdf(path).await,
            DocumentKind::Image => self.extract_image(path).await,
            DocumentKind::Other(ext) => {
                let bytes = tokio::fs::read(path).await.map_err(|source| OcrError::Io {
                    path: path.display().to_string(),
                    source,
                })?;

                match String::from_utf8(bytes) {
                    Ok(text) => Ok(text),
                    Err(_) => self.extract_image(path).await.map_err(|e| {
                        error!("Unsupported file format {:?}: {}", ext, e);
                        OcrError::UnsupportedFormat(ext)
                    }),
                }
            }
        }
    }
}

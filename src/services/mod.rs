// src/services/mod.rs
pub mod mcq;
pub mod ocr;
pub mod s3;

pub use mcq::{McqError, McqService};
pub use ocr::{OcrService, TesseractEngine, TextExtractor};
pub use s3::{AssetDownloader, S3Service};

// ABOUTME: Error types for the bibslide application
// ABOUTME: Provides structured error handling for loading, chunking and every export format

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SlideError {
    #[error("Failed to read or write file: {0}")]
    FileError(#[from] std::io::Error),

    #[error("Failed to fetch remote resource: {0}")]
    FetchError(#[from] reqwest::Error),

    #[error("Invalid resource path: {0}")]
    InvalidResourcePath(String),

    #[error("Failed to parse JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Failed to decode image: {0}")]
    ImageError(#[from] image::ImageError),

    #[error("Headless browser error: {message}")]
    BrowserError {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("PPTX generation error: {0}")]
    PptxError(String),

    #[error("PDF generation error: {0}")]
    PdfError(String),

    #[error("Passage lookup failed: {0}")]
    LookupError(#[from] crate::lookup::LookupError),

    #[error("Input validation error: {0}")]
    ValidationError(String),

    #[error("Path not found: {0}")]
    PathNotFoundError(PathBuf),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Watch error: {0}")]
    WatchError(String),

    #[error("Unknown error: {0}")]
    UnknownError(String),
}

impl From<anyhow::Error> for SlideError {
    fn from(err: anyhow::Error) -> Self {
        SlideError::UnknownError(err.to_string())
    }
}

impl From<zip::result::ZipError> for SlideError {
    fn from(err: zip::result::ZipError) -> Self {
        SlideError::PptxError(format!("ZIP operation failed: {}", err))
    }
}

impl From<lopdf::Error> for SlideError {
    fn from(err: lopdf::Error) -> Self {
        SlideError::PdfError(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, SlideError>;

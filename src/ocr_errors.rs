//! # OCR Error Types Module
//!
//! This module defines custom error types used by the recognition layer.
//! "Still loading" and "failed to load" are separate variants so callers can
//! poll the engine and disable actions accordingly.

/// Custom error types for OCR operations
#[derive(Debug, Clone, PartialEq)]
pub enum OcrError {
    /// The recognition model is still being loaded in the background
    ModelLoading,
    /// The recognition model failed to load
    Initialization(String),
    /// Image loading errors
    ImageLoad(String),
    /// Text recognition errors
    Recognition(String),
}

impl OcrError {
    /// Whether the error is transient and the request may be retried later
    pub fn is_retryable(&self) -> bool {
        matches!(self, OcrError::ModelLoading)
    }
}

impl std::fmt::Display for OcrError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OcrError::ModelLoading => write!(f, "[OCR_LOADING] Recognition model is still loading"),
            OcrError::Initialization(msg) => write!(f, "[OCR_INIT] Recognition model failed to load: {}", msg),
            OcrError::ImageLoad(msg) => write!(f, "[IMAGE_LOAD] Failed to load image for OCR processing: {}", msg),
            OcrError::Recognition(msg) => write!(f, "[OCR_RECOGNIZE] Text recognition failed: {}", msg),
        }
    }
}

impl std::error::Error for OcrError {}

impl From<anyhow::Error> for OcrError {
    fn from(err: anyhow::Error) -> Self {
        OcrError::Recognition(err.to_string())
    }
}

impl From<image::ImageError> for OcrError {
    fn from(err: image::ImageError) -> Self {
        OcrError::ImageLoad(err.to_string())
    }
}

//! # Application Error Types
//!
//! This module defines common error types used throughout the address-ocr application.
//! It provides structured error handling for configuration, preprocessing and recognition.

use std::fmt;

/// General application error type for consistent error handling
#[derive(Debug, Clone, PartialEq)]
pub enum AppError {
    /// Configuration validation errors
    Config(String),
    /// Validation errors (input paths, arguments, etc.)
    Validation(String),
    /// Text recognition errors
    Ocr(String),
    /// Image preprocessing errors
    Preprocessing(String),
    /// Internal application errors
    Internal(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Config(msg) => write!(f, "[CONFIG] {}", msg),
            AppError::Validation(msg) => write!(f, "[VALIDATION] {}", msg),
            AppError::Ocr(msg) => write!(f, "[OCR] {}", msg),
            AppError::Preprocessing(msg) => write!(f, "[PREPROCESSING] {}", msg),
            AppError::Internal(msg) => write!(f, "[INTERNAL] {}", msg),
        }
    }
}

impl std::error::Error for AppError {}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Internal(err.to_string())
    }
}

impl From<crate::ocr_errors::OcrError> for AppError {
    fn from(err: crate::ocr_errors::OcrError) -> Self {
        AppError::Ocr(err.to_string())
    }
}

impl From<crate::preprocessing::PreprocessingError> for AppError {
    fn from(err: crate::preprocessing::PreprocessingError) -> Self {
        AppError::Preprocessing(err.to_string())
    }
}

/// Result type alias for convenience
pub type AppResult<T> = Result<T, AppError>;

/// Standardized error logging utilities for consistent error reporting across the application
pub mod error_logging {
    use tracing::error;

    /// Log OCR processing errors with image and processing context
    pub fn log_ocr_error(
        error: &impl std::fmt::Display,
        operation: &str,
        image_path: Option<&str>,
        processing_duration: Option<std::time::Duration>,
    ) {
        error!(
            error = %error,
            operation = %operation,
            image_path = ?image_path,
            processing_duration_ms = ?processing_duration.map(|d| d.as_millis()),
            "OCR processing failed"
        );
    }

    /// Log preprocessing errors with image dimension context
    pub fn log_preprocessing_error(
        error: &impl std::fmt::Display,
        operation: &str,
        dimensions: Option<(u32, u32)>,
    ) {
        error!(
            error = %error,
            operation = %operation,
            dimensions = ?dimensions,
            "Image preprocessing failed"
        );
    }

    /// Log configuration errors during startup/initialization
    pub fn log_config_error(error: &impl std::fmt::Display, config_key: &str, operation: &str) {
        error!(
            error = %error,
            config_key = %config_key,
            operation = %operation,
            "Configuration error"
        );
    }
}

//! # Unified Application Configuration
//!
//! This module provides a centralized configuration system that consolidates
//! all application settings into a single, structured configuration object.
//! It supports loading from environment variables (and a `.env` file via
//! `dotenvy`), validation, and a summary for startup logging.

use crate::errors::{AppError, AppResult};
use crate::observability_config::ObservabilityConfig;
use crate::preprocessing::{BinarizationParams, ThresholdMethod};
use std::env;
use std::str::FromStr;

/// Image preprocessing settings for the enhanced recognition pass
#[derive(Debug, Clone, PartialEq)]
pub struct PreprocessingConfig {
    /// Images narrower than this are upscaled before binarization
    pub min_width: u32,
    /// CLAHE clip limit
    pub clahe_clip_limit: f32,
    /// CLAHE tile grid (tiles per axis)
    pub clahe_grid: u32,
    /// Adaptive binarization parameters
    pub binarization: BinarizationParams,
    /// Median filter radius applied after binarization (0 disables)
    pub denoise_radius: u32,
}

impl Default for PreprocessingConfig {
    fn default() -> Self {
        Self {
            min_width: 800,
            clahe_clip_limit: 2.0,
            clahe_grid: 8,
            binarization: BinarizationParams::sauvola(),
            denoise_radius: 1,
        }
    }
}

impl PreprocessingConfig {
    /// Validate preprocessing configuration
    pub fn validate(&self) -> AppResult<()> {
        if self.min_width == 0 {
            return Err(AppError::Config(
                "min_width must be greater than 0".to_string(),
            ));
        }
        if !(self.clahe_clip_limit > 0.0 && self.clahe_clip_limit.is_finite()) {
            return Err(AppError::Config(format!(
                "clahe_clip_limit must be a positive number, got {}",
                self.clahe_clip_limit
            )));
        }
        if self.clahe_grid == 0 {
            return Err(AppError::Config(
                "clahe_grid must be greater than 0".to_string(),
            ));
        }
        if self.denoise_radius > 5 {
            return Err(AppError::Config(format!(
                "denoise_radius ({}) cannot be greater than 5",
                self.denoise_radius
            )));
        }
        self.binarization
            .validate()
            .map_err(|e| AppError::Config(e.to_string()))
    }
}

/// Recognition engine settings
#[derive(Debug, Clone, PartialEq)]
pub struct RecognitionConfig {
    /// Recognizer language codes (e.g. "rus+eng")
    pub languages: String,
    /// Optional directory with recognizer model data
    pub data_path: Option<String>,
    /// Fragments with confidence at or below this value never reach the parser
    pub confidence_cutoff: f32,
    /// How long the CLI waits for the model to finish loading
    pub load_timeout_secs: u64,
}

impl Default for RecognitionConfig {
    fn default() -> Self {
        Self {
            languages: "rus+eng".to_string(),
            data_path: None,
            confidence_cutoff: 0.3,
            load_timeout_secs: 120,
        }
    }
}

impl RecognitionConfig {
    /// Validate recognition configuration
    pub fn validate(&self) -> AppResult<()> {
        if self.languages.trim().is_empty() {
            return Err(AppError::Config("languages cannot be empty".to_string()));
        }
        if !(0.0..=1.0).contains(&self.confidence_cutoff) {
            return Err(AppError::Config(format!(
                "confidence_cutoff must be within [0, 1], got {}",
                self.confidence_cutoff
            )));
        }
        if self.load_timeout_secs == 0 {
            return Err(AppError::Config(
                "load_timeout_secs must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}

/// Address parser settings
#[derive(Debug, Clone, PartialEq)]
pub struct ParserConfig {
    /// Largest trailing number accepted as a house number when splitting it off the street name
    pub max_trailing_house_number: u32,
    /// Explicit vocabulary file; falls back to the default search paths when unset
    pub vocabulary_path: Option<String>,
    /// Remove combined-text street types and edge separators from the street name
    pub clean_street_name: bool,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            max_trailing_house_number: 1000,
            vocabulary_path: None,
            clean_street_name: false,
        }
    }
}

impl ParserConfig {
    /// Validate parser configuration
    pub fn validate(&self) -> AppResult<()> {
        if self.max_trailing_house_number == 0 {
            return Err(AppError::Config(
                "max_trailing_house_number must be greater than 0".to_string(),
            ));
        }
        if let Some(path) = &self.vocabulary_path {
            if path.trim().is_empty() {
                return Err(AppError::Config(
                    "vocabulary_path cannot be empty if provided".to_string(),
                ));
            }
        }
        Ok(())
    }
}

/// Unified application configuration
#[derive(Debug, Clone, Default)]
pub struct AppConfig {
    /// Preprocessing configuration
    pub preprocessing: PreprocessingConfig,
    /// Recognition configuration
    pub recognition: RecognitionConfig,
    /// Address parser configuration
    pub parser: ParserConfig,
    /// Observability configuration
    pub observability: ObservabilityConfig,
}

/// Read `key` and parse it, using `default` when the variable is unset.
fn parse_env_var<T: FromStr>(key: &str, default: T) -> AppResult<T> {
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|_| AppError::Config(format!("{} has an invalid value: '{}'", key, raw))),
        Err(_) => Ok(default),
    }
}

impl AppConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> AppResult<Self> {
        let mut config = Self::default();

        // Load preprocessing configuration
        let method = match env::var("BINARIZATION_METHOD") {
            Ok(name) => ThresholdMethod::parse(&name).ok_or_else(|| {
                AppError::Config(format!(
                    "BINARIZATION_METHOD must be 'sauvola' or 'niblack', got '{}'",
                    name
                ))
            })?,
            Err(_) => ThresholdMethod::Sauvola,
        };
        let defaults = match method {
            ThresholdMethod::Sauvola => BinarizationParams::sauvola(),
            ThresholdMethod::Niblack => BinarizationParams::niblack(),
        };
        let window_size = parse_env_var("BINARIZATION_WINDOW_SIZE", defaults.window_size)?;
        let k = parse_env_var("BINARIZATION_K", defaults.k)?;
        let r = parse_env_var("BINARIZATION_R", defaults.r)?;
        config.preprocessing.binarization = BinarizationParams { r, ..defaults }
            .with_window_size(window_size)
            .with_k(k);
        config.preprocessing.min_width =
            parse_env_var("PREPROCESS_MIN_WIDTH", config.preprocessing.min_width)?;
        config.preprocessing.clahe_clip_limit =
            parse_env_var("CLAHE_CLIP_LIMIT", config.preprocessing.clahe_clip_limit)?;
        config.preprocessing.clahe_grid =
            parse_env_var("CLAHE_GRID", config.preprocessing.clahe_grid)?;
        config.preprocessing.denoise_radius =
            parse_env_var("DENOISE_RADIUS", config.preprocessing.denoise_radius)?;

        // Load recognition configuration
        if let Ok(languages) = env::var("OCR_LANGUAGES") {
            config.recognition.languages = languages;
        }
        config.recognition.data_path = env::var("OCR_DATA_PATH").ok();
        config.recognition.confidence_cutoff =
            parse_env_var("OCR_CONFIDENCE_CUTOFF", config.recognition.confidence_cutoff)?;
        config.recognition.load_timeout_secs =
            parse_env_var("OCR_LOAD_TIMEOUT_SECS", config.recognition.load_timeout_secs)?;

        // Load parser configuration
        config.parser.max_trailing_house_number = parse_env_var(
            "MAX_TRAILING_HOUSE_NUMBER",
            config.parser.max_trailing_house_number,
        )?;
        config.parser.vocabulary_path = env::var("ADDRESS_VOCABULARY_PATH").ok();
        config.parser.clean_street_name =
            parse_env_var("CLEAN_STREET_NAME", config.parser.clean_street_name)?;

        // Load observability configuration
        config.observability = ObservabilityConfig::from_env().map_err(AppError::Config)?;

        Ok(config)
    }

    /// Validate all configuration sections
    pub fn validate(&self) -> AppResult<()> {
        self.preprocessing.validate()?;
        self.recognition.validate()?;
        self.parser.validate()?;
        self.observability
            .validate()
            .map_err(AppError::Config)?;
        Ok(())
    }

    /// Get a summary of the current configuration for logging
    pub fn summary(&self) -> String {
        format!(
            "Configuration: method={}, window={}, k={}, r={}, min_width={}, languages={}, confidence_cutoff={}, environment={}",
            self.preprocessing.binarization.method,
            self.preprocessing.binarization.window_size,
            self.preprocessing.binarization.k,
            self.preprocessing.binarization.r,
            self.preprocessing.min_width,
            self.recognition.languages,
            self.recognition.confidence_cutoff,
            self.observability.environment
        )
    }
}

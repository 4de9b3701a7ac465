//! # Observability Configuration
//!
//! Environment-specific configuration for logging and trace output.

use std::env;

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable multi-line output
    Pretty,
    /// One JSON object per event
    Json,
}

impl LogFormat {
    fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "pretty" => Some(LogFormat::Pretty),
            "json" => Some(LogFormat::Json),
            _ => None,
        }
    }
}

/// Observability configuration for different environments
#[derive(Debug, Clone)]
pub struct ObservabilityConfig {
    /// Environment name (development, staging, production)
    pub environment: String,
    /// Log level for crate components
    pub log_level: String,
    /// Explicit log format; derived from the environment when unset
    pub log_format: Option<LogFormat>,
    /// Whether parser stage decisions are logged at debug level
    pub trace_parser_stages: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            environment: "development".to_string(),
            log_level: "info".to_string(),
            log_format: None,
            trace_parser_stages: true,
        }
    }
}

impl ObservabilityConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, String> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from `lookup`, which returns the raw value of a variable.
    ///
    /// Unset variables take their defaults; values that do not parse are errors.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, String>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let log_format = match lookup("LOG_FORMAT") {
            Some(raw) => Some(
                LogFormat::parse(&raw)
                    .ok_or_else(|| format!("LOG_FORMAT must be 'pretty' or 'json', got '{}'", raw))?,
            ),
            None => defaults.log_format,
        };
        let trace_parser_stages = match lookup("TRACE_PARSER_STAGES") {
            Some(raw) => raw.trim().parse().map_err(|_| {
                format!("TRACE_PARSER_STAGES must be 'true' or 'false', got '{}'", raw)
            })?,
            None => defaults.trace_parser_stages,
        };

        Ok(Self {
            environment: lookup("ENVIRONMENT").unwrap_or(defaults.environment),
            log_level: lookup("LOG_LEVEL").unwrap_or(defaults.log_level),
            log_format,
            trace_parser_stages,
        })
    }

    /// Check if running in production environment
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    /// Check if running in development environment
    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }

    /// Effective log format: explicit setting, else pretty in development and JSON elsewhere
    pub fn effective_log_format(&self) -> LogFormat {
        self.log_format.unwrap_or(if self.is_development() {
            LogFormat::Pretty
        } else {
            LogFormat::Json
        })
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        const LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];
        if !LEVELS.contains(&self.log_level.to_lowercase().as_str()) {
            return Err(format!("Invalid log level: {}", self.log_level));
        }
        if self.environment.trim().is_empty() {
            return Err("Environment name cannot be empty".to_string());
        }
        Ok(())
    }
}

/// Environment-specific configuration presets
pub mod presets {
    use super::{LogFormat, ObservabilityConfig};

    /// Development configuration with verbose logging
    pub fn development() -> ObservabilityConfig {
        ObservabilityConfig {
            environment: "development".to_string(),
            log_level: "debug".to_string(),
            ..Default::default()
        }
    }

    /// Production configuration with JSON logs and no stage narration
    pub fn production() -> ObservabilityConfig {
        ObservabilityConfig {
            environment: "production".to_string(),
            log_level: "warn".to_string(),
            log_format: Some(LogFormat::Json),
            trace_parser_stages: false,
        }
    }
}

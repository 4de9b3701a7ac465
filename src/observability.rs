//! Observability module for centralized tracing, logging and metrics setup.
//!
//! This module provides:
//! - Structured logging configuration (pretty in development, JSON otherwise)
//! - Tracing span creation utilities for each pipeline component
//! - Metrics recording helpers (recorded through the `metrics` facade; they are
//!   no-ops until an exporter is installed by the embedding application)

use anyhow::Result;
use tracing_subscriber::prelude::*;

use crate::observability_config::{LogFormat, ObservabilityConfig};

/// Initialize structured logging with tracing and configuration
pub fn init_tracing_with_config(config: &ObservabilityConfig) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::from_default_env()
        .add_directive(format!("address_ocr={}", config.log_level).parse()?)
        .add_directive(
            format!(
                "address_parser={}",
                if config.trace_parser_stages { "debug" } else { "warn" }
            )
            .parse()?,
        );

    match config.effective_log_format() {
        LogFormat::Pretty => {
            tracing_subscriber::registry()
                .with(filter)
                .with(
                    tracing_subscriber::fmt::layer()
                        .pretty()
                        .with_target(true)
                        .with_thread_ids(false)
                        .with_thread_names(false),
                )
                .try_init()?;
        }
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(filter)
                .with(
                    tracing_subscriber::fmt::layer()
                        .json()
                        .with_target(true)
                        .with_thread_ids(true)
                        .with_thread_names(true),
                )
                .try_init()?;
        }
    }

    tracing::info!(
        environment = %config.environment,
        log_level = %config.log_level,
        "Tracing initialized with structured logging"
    );
    Ok(())
}

/// Create a span for OCR operations
pub fn ocr_span(operation: &str) -> tracing::Span {
    tracing::info_span!("ocr_operation", operation = operation, component = "ocr")
}

/// Create a span for image preprocessing operations
pub fn preprocessing_span(operation: &str) -> tracing::Span {
    tracing::info_span!(
        "preprocessing_operation",
        operation = operation,
        component = "preprocessing"
    )
}

/// Create a span for address parsing
pub fn parse_span(fragment_count: usize) -> tracing::Span {
    tracing::debug_span!(
        "address_parse",
        fragment_count = fragment_count,
        component = "address_parser"
    )
}

/// Record the outcome of one recognition run
pub fn record_recognition_metrics(
    pass: &'static str,
    success: bool,
    fragment_count: usize,
    duration: std::time::Duration,
) {
    let status = if success { "success" } else { "failure" };
    metrics::counter!("ocr_passes_total", "pass" => pass, "status" => status).increment(1);
    metrics::histogram!("ocr_pass_duration_seconds", "pass" => pass).record(duration.as_secs_f64());
    if success {
        metrics::histogram!("ocr_pass_fragments", "pass" => pass).record(fragment_count as f64);
    }
}

/// Record how fusion treated the enhanced-pass fragments
pub fn record_fusion_metrics(replaced: usize, discarded: usize) {
    metrics::counter!("fusion_replaced_total").increment(replaced as u64);
    metrics::counter!("fusion_discarded_total").increment(discarded as u64);
}

/// Record the outcome of one address parse
pub fn record_parse_metrics(found_street_type: bool, found_house_number: bool) {
    metrics::counter!("address_parses_total").increment(1);
    if found_street_type {
        metrics::counter!("address_street_type_found_total").increment(1);
    }
    if found_house_number {
        metrics::counter!("address_house_number_found_total").increment(1);
    }
}

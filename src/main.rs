use anyhow::Result;
use address_ocr::config::{AppConfig, RecognitionConfig};
use address_ocr::errors::{error_logging, AppError};
use address_ocr::ocr_errors::OcrError;
use address_ocr::recognition::{EngineState, RecognitionEngine, TextRecognizer};
use address_ocr::{observability, AddressPipeline};
use std::env;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{error, info};

/// Build the recognizer the binary was compiled with
#[cfg(feature = "tesseract")]
fn load_recognizer(config: RecognitionConfig) -> Result<Box<dyn TextRecognizer>, OcrError> {
    address_ocr::tesseract::TesseractRecognizer::new(&config)
        .map(|recognizer| Box::new(recognizer) as Box<dyn TextRecognizer>)
}

#[cfg(not(feature = "tesseract"))]
fn load_recognizer(config: RecognitionConfig) -> Result<Box<dyn TextRecognizer>, OcrError> {
    Err(OcrError::Initialization(format!(
        "no text recognizer available for languages '{}'; rebuild with the `tesseract` feature",
        config.languages
    )))
}

/// Validate command-line image paths
fn validate_image_paths(args: &[String]) -> Result<Vec<PathBuf>, AppError> {
    if args.is_empty() {
        return Err(AppError::Validation(
            "usage: address-ocr <image>...".to_string(),
        ));
    }
    args.iter()
        .map(|arg| {
            let path = PathBuf::from(arg);
            if path.is_file() {
                Ok(path)
            } else {
                Err(AppError::Validation(format!("'{}' is not a readable file", arg)))
            }
        })
        .collect()
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file first
    dotenvy::dotenv().ok();

    let config = AppConfig::from_env()?;
    config.validate().map_err(|e| {
        anyhow::anyhow!("Configuration validation failed: {}. Please check your environment variables.", e)
    })?;

    observability::init_tracing_with_config(&config.observability)?;
    info!("{}", config.summary());

    let args: Vec<String> = env::args().skip(1).collect();
    let paths = validate_image_paths(&args)?;

    let recognition_config = config.recognition.clone();
    let engine = RecognitionEngine::start(
        move || load_recognizer(recognition_config),
        config.preprocessing.clone(),
    );

    let timeout = Duration::from_secs(config.recognition.load_timeout_secs);
    let waiting = engine.clone();
    match tokio::task::spawn_blocking(move || waiting.wait_until_ready(timeout)).await? {
        EngineState::Ready => info!("Recognition engine ready"),
        EngineState::Loading => {
            return Err(anyhow::anyhow!(
                "Recognition model did not load within {} seconds",
                timeout.as_secs()
            ))
        }
        EngineState::Failed(message) => return Err(anyhow::anyhow!(message)),
    }

    let pipeline = AddressPipeline::from_config(engine, &config).map_err(|e| {
        error_logging::log_config_error(&e, "ADDRESS_VOCABULARY_PATH", "build_pipeline");
        e
    })?;

    let mut failures = 0usize;
    for path in paths {
        let worker = pipeline.clone();
        let image_path = path.clone();
        // One in-flight pipeline per image
        let outcome = tokio::task::spawn_blocking(move || worker.process(&image_path)).await?;

        match outcome {
            Ok(output) => println!("{}", serde_json::to_string_pretty(&output)?),
            Err(e) => {
                failures += 1;
                error_logging::log_ocr_error(&e, "process_image", path.to_str(), None);
                error!(image_path = %path.display(), "Address extraction failed");
            }
        }
    }

    if failures > 0 {
        return Err(anyhow::anyhow!("{} image(s) could not be processed", failures));
    }
    Ok(())
}

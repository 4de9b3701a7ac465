//! # Address Pipeline
//!
//! Photograph in, address out: two-pass recognition, confidence filtering and parsing.

use std::path::Path;

use serde::Serialize;

use crate::address::{AddressParser, AddressRecord};
use crate::config::AppConfig;
use crate::errors::AppResult;
use crate::ocr_errors::OcrError;
use crate::recognition::{Fragment, RecognitionEngine};

/// Everything recognized in one photograph.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PipelineOutput {
    /// Fused fragments, including those below the confidence cutoff
    pub fragments: Vec<Fragment>,
    pub address: AddressRecord,
    /// Display form of the address
    pub full_address: String,
}

/// Runs recognition and parsing for one image at a time.
#[derive(Clone)]
pub struct AddressPipeline {
    engine: RecognitionEngine,
    parser: AddressParser,
    confidence_cutoff: f32,
}

impl AddressPipeline {
    pub fn new(engine: RecognitionEngine, parser: AddressParser, confidence_cutoff: f32) -> Self {
        Self {
            engine,
            parser,
            confidence_cutoff,
        }
    }

    /// Build the pipeline from configuration around an existing engine.
    pub fn from_config(engine: RecognitionEngine, config: &AppConfig) -> AppResult<Self> {
        config.recognition.validate()?;
        let parser = AddressParser::from_config(&config.parser)?;
        Ok(Self::new(
            engine,
            parser,
            config.recognition.confidence_cutoff,
        ))
    }

    pub fn engine(&self) -> &RecognitionEngine {
        &self.engine
    }

    /// Parse the fragments whose confidence is strictly above the cutoff.
    pub fn extract_address(&self, fragments: &[Fragment]) -> AddressRecord {
        let confident: Vec<&str> = fragments
            .iter()
            .filter(|f| f.confidence > self.confidence_cutoff)
            .map(|f| f.text.as_str())
            .collect();

        tracing::debug!(
            total = fragments.len(),
            confident = confident.len(),
            cutoff = self.confidence_cutoff,
            "Filtered fragments by confidence"
        );
        self.parser.parse(&confident)
    }

    /// Recognize the photograph at `path` and extract its address.
    pub fn process(&self, path: &Path) -> Result<PipelineOutput, OcrError> {
        let fragments = self.engine.process_image(path)?;
        let address = self.extract_address(&fragments);
        metrics::counter!("pipeline_runs_total").increment(1);

        Ok(PipelineOutput {
            full_address: address.full_address(),
            fragments,
            address,
        })
    }
}

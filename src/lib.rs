//! # Address OCR
//!
//! Extracts a structured street address (street type, street name, house
//! number) from a photograph by combining adaptive binarization, a text
//! recognizer run on both the untouched and the enhanced image, and a
//! noise-tolerant address parser.

pub mod address;
pub mod config;
pub mod errors;
pub mod fusion;
pub mod observability;
pub mod observability_config;
pub mod ocr_errors;
pub mod pipeline;
pub mod preprocessing;
pub mod recognition;
#[cfg(feature = "tesseract")]
pub mod tesseract;

// Re-export types for easier access
pub use address::{AddressParser, AddressRecord, AddressVocabulary};
pub use pipeline::{AddressPipeline, PipelineOutput};
pub use recognition::{EngineState, Fragment, Point, RecognitionEngine, TextRecognizer};

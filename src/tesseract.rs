//! # Tesseract Recognizer
//!
//! [`TextRecognizer`] backed by Tesseract through `leptess`. Word-level boxes
//! from Tesseract's TSV output become fragments with rectangular polygons.

use std::io::Cursor;

use image::{DynamicImage, ImageFormat};
use leptess::LepTess;
use parking_lot::Mutex;
use tracing::info;

use crate::config::RecognitionConfig;
use crate::ocr_errors::OcrError;
use crate::recognition::{Fragment, TextRecognizer};

/// TSV level of individual words.
const WORD_LEVEL: &str = "5";

/// Tesseract instance guarded for use from several threads.
pub struct TesseractRecognizer {
    tess: Mutex<LepTess>,
}

impl TesseractRecognizer {
    /// Initialize Tesseract with the configured languages and data directory.
    pub fn new(config: &RecognitionConfig) -> Result<Self, OcrError> {
        info!(
            "Creating Tesseract instance for languages: {}",
            config.languages
        );
        let tess = LepTess::new(config.data_path.as_deref(), &config.languages)
            .map_err(|e| OcrError::Initialization(format!("Failed to initialize Tesseract: {}", e)))?;
        Ok(Self {
            tess: Mutex::new(tess),
        })
    }
}

impl TextRecognizer for TesseractRecognizer {
    fn recognize(&self, image: &DynamicImage) -> Result<Vec<Fragment>, OcrError> {
        let mut encoded = Vec::new();
        image
            .write_to(&mut Cursor::new(&mut encoded), ImageFormat::Png)
            .map_err(|e| OcrError::ImageLoad(format!("Failed to encode image for Tesseract: {}", e)))?;

        let mut tess = self.tess.lock();
        tess.set_image_from_mem(&encoded)
            .map_err(|e| OcrError::ImageLoad(format!("Failed to load image into Tesseract: {}", e)))?;
        let tsv = tess
            .get_tsv_text(0)
            .map_err(|e| OcrError::Recognition(format!("Failed to read Tesseract output: {}", e)))?;

        Ok(parse_tsv(&tsv))
    }
}

/// Convert Tesseract TSV output into word fragments.
///
/// Rows other than word rows, rows without text and rows with a negative
/// confidence are skipped. Confidence is rescaled from 0..100 to 0..1.
pub fn parse_tsv(tsv: &str) -> Vec<Fragment> {
    tsv.lines()
        .filter_map(|line| {
            let columns: Vec<&str> = line.split('\t').collect();
            if columns.len() < 12 || columns[0] != WORD_LEVEL {
                return None;
            }
            let text = columns[11].trim();
            let confidence: f32 = columns[10].trim().parse().ok()?;
            if text.is_empty() || confidence < 0.0 {
                return None;
            }
            let number = |i: usize| columns[i].trim().parse::<f32>().ok();
            Some(Fragment::rectangle(
                number(6)?,
                number(7)?,
                number(8)?,
                number(9)?,
                text,
                confidence / 100.0,
            ))
        })
        .collect()
}

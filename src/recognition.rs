//! # Recognition Engine Module
//!
//! Wraps a [`TextRecognizer`] with background model loading and the two-pass
//! recognize-and-fuse flow.
//!
//! The model loads on its own thread so callers can start up immediately and
//! poll [`RecognitionEngine::state`]. Requests made while the model is loading
//! fail with [`OcrError::ModelLoading`]; requests after a failed load fail with
//! [`OcrError::Initialization`].

use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use image::DynamicImage;
use parking_lot::{Condvar, Mutex};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use crate::config::PreprocessingConfig;
use crate::fusion::merge_passes;
use crate::observability::{ocr_span, record_recognition_metrics};
use crate::ocr_errors::OcrError;
use crate::preprocessing::try_prepare;

/// A point of a fragment polygon, in pixels of the untouched image.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// One text span returned by a recognizer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fragment {
    /// Bounding polygon, points in order
    pub polygon: Vec<Point>,
    pub text: String,
    /// Recognizer confidence in [0, 1]
    pub confidence: f32,
}

impl Fragment {
    pub fn new(polygon: Vec<Point>, text: impl Into<String>, confidence: f32) -> Self {
        Self {
            polygon,
            text: text.into(),
            confidence: confidence.clamp(0.0, 1.0),
        }
    }

    /// Fragment with an axis-aligned rectangular polygon.
    pub fn rectangle(
        left: f32,
        top: f32,
        width: f32,
        height: f32,
        text: impl Into<String>,
        confidence: f32,
    ) -> Self {
        Self::new(
            vec![
                Point::new(left, top),
                Point::new(left + width, top),
                Point::new(left + width, top + height),
                Point::new(left, top + height),
            ],
            text,
            confidence,
        )
    }
}

/// A text detection and recognition model.
pub trait TextRecognizer: Send + Sync {
    /// Recognize every text span in `image`.
    fn recognize(&self, image: &DynamicImage) -> Result<Vec<Fragment>, OcrError>;
}

/// Load state of the recognition model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineState {
    Loading,
    Ready,
    Failed(String),
}

enum LoadSlot {
    Loading,
    Ready(Arc<dyn TextRecognizer>),
    Failed(String),
}

struct Shared {
    slot: Mutex<LoadSlot>,
    loaded: Condvar,
}

/// Recognition model with background loading.
///
/// Cloning shares the same model.
#[derive(Clone)]
pub struct RecognitionEngine {
    shared: Arc<Shared>,
    preprocessing: PreprocessingConfig,
}

impl RecognitionEngine {
    /// Start loading a recognizer on a background thread.
    ///
    /// # Arguments
    ///
    /// * `loader` - Builds the recognizer; runs once, off the calling thread
    /// * `preprocessing` - Settings for the enhanced second pass
    ///
    /// # Examples
    ///
    /// ```rust
    /// use std::time::Duration;
    /// use address_ocr::config::PreprocessingConfig;
    /// use address_ocr::ocr_errors::OcrError;
    /// use address_ocr::recognition::{EngineState, Fragment, RecognitionEngine, TextRecognizer};
    ///
    /// struct Silent;
    /// impl TextRecognizer for Silent {
    ///     fn recognize(&self, _: &image::DynamicImage) -> Result<Vec<Fragment>, OcrError> {
    ///         Ok(Vec::new())
    ///     }
    /// }
    ///
    /// let engine = RecognitionEngine::start(
    ///     || Ok(Box::new(Silent) as Box<dyn TextRecognizer>),
    ///     PreprocessingConfig::default(),
    /// );
    /// assert_eq!(engine.wait_until_ready(Duration::from_secs(5)), EngineState::Ready);
    /// ```
    pub fn start<F>(loader: F, preprocessing: PreprocessingConfig) -> Self
    where
        F: FnOnce() -> Result<Box<dyn TextRecognizer>, OcrError> + Send + 'static,
    {
        let shared = Arc::new(Shared {
            slot: Mutex::new(LoadSlot::Loading),
            loaded: Condvar::new(),
        });

        let background = Arc::clone(&shared);
        let spawned = std::thread::Builder::new()
            .name("recognizer-loader".to_string())
            .spawn(move || {
                let start_time = Instant::now();
                let outcome = match loader() {
                    Ok(recognizer) => {
                        info!(
                            "Recognition model loaded in {}ms",
                            start_time.elapsed().as_millis()
                        );
                        LoadSlot::Ready(Arc::from(recognizer))
                    }
                    Err(e) => {
                        error!(error = %e, "Recognition model failed to load");
                        LoadSlot::Failed(e.to_string())
                    }
                };
                *background.slot.lock() = outcome;
                background.loaded.notify_all();
            });

        if let Err(e) = spawned {
            error!(error = %e, "Failed to spawn recognizer loader thread");
            *shared.slot.lock() = LoadSlot::Failed(format!("loader thread: {}", e));
        }

        Self {
            shared,
            preprocessing,
        }
    }

    /// Engine around an already loaded recognizer.
    pub fn with_recognizer(
        recognizer: Arc<dyn TextRecognizer>,
        preprocessing: PreprocessingConfig,
    ) -> Self {
        Self {
            shared: Arc::new(Shared {
                slot: Mutex::new(LoadSlot::Ready(recognizer)),
                loaded: Condvar::new(),
            }),
            preprocessing,
        }
    }

    /// Current load state.
    pub fn state(&self) -> EngineState {
        match &*self.shared.slot.lock() {
            LoadSlot::Loading => EngineState::Loading,
            LoadSlot::Ready(_) => EngineState::Ready,
            LoadSlot::Failed(message) => EngineState::Failed(message.clone()),
        }
    }

    /// Block until the model finished loading (successfully or not) or `timeout` elapses.
    pub fn wait_until_ready(&self, timeout: Duration) -> EngineState {
        let deadline = Instant::now() + timeout;
        let mut slot = self.shared.slot.lock();
        while matches!(*slot, LoadSlot::Loading) {
            if self.shared.loaded.wait_until(&mut slot, deadline).timed_out() {
                break;
            }
        }
        drop(slot);
        self.state()
    }

    fn recognizer(&self) -> Result<Arc<dyn TextRecognizer>, OcrError> {
        match &*self.shared.slot.lock() {
            LoadSlot::Loading => Err(OcrError::ModelLoading),
            LoadSlot::Ready(recognizer) => Ok(Arc::clone(recognizer)),
            LoadSlot::Failed(message) => Err(OcrError::Initialization(message.clone())),
        }
    }

    fn run_pass(
        recognizer: &dyn TextRecognizer,
        image: &DynamicImage,
        pass: &'static str,
    ) -> Result<Vec<Fragment>, OcrError> {
        let start_time = Instant::now();
        let result = recognizer.recognize(image);
        let fragment_count = result.as_ref().map(Vec::len).unwrap_or(0);
        record_recognition_metrics(pass, result.is_ok(), fragment_count, start_time.elapsed());
        debug!(
            pass,
            fragment_count,
            duration_ms = start_time.elapsed().as_millis() as u64,
            "Recognition pass finished"
        );
        result
    }

    /// Recognize an already decoded image, with an optional enhanced copy.
    ///
    /// Without an enhanced image, or when its pass fails, the raw pass is returned alone.
    pub fn recognize_passes(
        &self,
        raw: &DynamicImage,
        enhanced: Option<&DynamicImage>,
    ) -> Result<Vec<Fragment>, OcrError> {
        let recognizer = self.recognizer()?;
        let pass_a = Self::run_pass(recognizer.as_ref(), raw, "raw")?;

        let Some(enhanced) = enhanced else {
            debug!("No enhanced image, using the raw pass only");
            return Ok(pass_a);
        };

        match Self::run_pass(recognizer.as_ref(), enhanced, "enhanced") {
            Ok(pass_b) => Ok(merge_passes(&pass_a, &pass_b)),
            Err(e) => {
                warn!(error = %e, "Enhanced recognition pass failed, using the raw pass only");
                Ok(pass_a)
            }
        }
    }

    /// Recognize the photograph at `path` in two passes and fuse the results.
    pub fn process_image(&self, path: &Path) -> Result<Vec<Fragment>, OcrError> {
        let span = ocr_span("process_image");
        let _enter = span.enter();
        let start_time = Instant::now();

        // Fail fast while the model is unavailable
        self.recognizer()?;

        let raw = image::open(path).map_err(|e| {
            let err = OcrError::ImageLoad(format!("{}: {}", path.display(), e));
            crate::errors::error_logging::log_ocr_error(
                &err,
                "decode_image",
                path.to_str(),
                Some(start_time.elapsed()),
            );
            err
        })?;

        let enhanced = try_prepare(&raw, &self.preprocessing)
            .map(|prepared| DynamicImage::ImageLuma8(prepared.image));

        let fragments = self.recognize_passes(&raw, enhanced.as_ref())?;
        info!(
            image_path = %path.display(),
            fragment_count = fragments.len(),
            duration_ms = start_time.elapsed().as_millis() as u64,
            "Image recognized"
        );
        Ok(fragments)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed(Vec<Fragment>);

    impl TextRecognizer for Fixed {
        fn recognize(&self, _image: &DynamicImage) -> Result<Vec<Fragment>, OcrError> {
            Ok(self.0.clone())
        }
    }

    #[test]
    fn test_fragment_confidence_is_clamped() {
        assert_eq!(Fragment::new(Vec::new(), "x", 1.7).confidence, 1.0);
        assert_eq!(Fragment::new(Vec::new(), "x", -0.2).confidence, 0.0);
    }

    #[test]
    fn test_rectangle_polygon() {
        let fragment = Fragment::rectangle(10.0, 20.0, 30.0, 5.0, "ул", 0.8);
        assert_eq!(fragment.polygon.len(), 4);
        assert_eq!(fragment.polygon[2], Point::new(40.0, 25.0));
    }

    #[test]
    fn test_failed_load_is_reported() {
        let engine = RecognitionEngine::start(
            || Err(OcrError::Initialization("no model".to_string())),
            PreprocessingConfig::default(),
        );
        let state = engine.wait_until_ready(Duration::from_secs(5));
        assert!(matches!(state, EngineState::Failed(ref msg) if msg.contains("no model")));
        assert!(matches!(
            engine.recognize_passes(&DynamicImage::new_luma8(1, 1), None),
            Err(OcrError::Initialization(_))
        ));
    }

    #[test]
    fn test_raw_pass_only_without_enhanced_image() {
        let fragments = vec![Fragment::rectangle(0.0, 0.0, 1.0, 1.0, "Садовая", 0.9)];
        let engine = RecognitionEngine::with_recognizer(
            Arc::new(Fixed(fragments.clone())),
            PreprocessingConfig::default(),
        );
        let result = engine
            .recognize_passes(&DynamicImage::new_luma8(4, 4), None)
            .unwrap();
        assert_eq!(result, fragments);
    }
}

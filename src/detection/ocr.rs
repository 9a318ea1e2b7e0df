use ocrs::{ImageSource, OcrEngine, OcrEngineParams};
use rten::Model;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tracing::info;

use crate::acquisition::StagingStore;
use crate::detection::{DecodeTarget, DetectError, Detector, resolve_raster};
use crate::models::RawDetection;

/// Type tag reported for recognized lines
pub const LINE_TAG: &str = "LINE";

/// Default model directory (`~/.cache/ocrs`)
pub fn default_model_dir() -> anyhow::Result<PathBuf> {
    let home_dir = std::env::var("HOME").or_else(|_| std::env::var("USERPROFILE"))?;
    Ok(Path::new(&home_dir).join(".cache/ocrs"))
}

/// Initialize OCR engine with the detection and recognition models in `model_dir`
pub fn init_ocr_engine(model_dir: &Path) -> anyhow::Result<OcrEngine> {
    let detection_model_path = model_dir.join("text-detection.rten");
    let recognition_model_path = model_dir.join("text-recognition.rten");

    if !detection_model_path.exists() || !recognition_model_path.exists() {
        anyhow::bail!(
            "OCR models not found. Please run: ocrs-cli --help (or download models manually)\n\
             Expected locations:\n  - {}\n  - {}",
            detection_model_path.display(),
            recognition_model_path.display()
        );
    }

    let detection_model = Model::load_file(&detection_model_path)?;
    let recognition_model = Model::load_file(&recognition_model_path)?;

    let engine = OcrEngine::new(OcrEngineParams {
        detection_model: Some(detection_model),
        recognition_model: Some(recognition_model),
        ..Default::default()
    })?;

    Ok(engine)
}

/// Local text-line recognition backed by `ocrs`
pub struct TextRecognizer {
    model_dir: PathBuf,
    store: Option<Arc<dyn StagingStore>>,
    // Loaded on first use and shared afterwards
    engine: Mutex<Option<Arc<OcrEngine>>>,
}

impl TextRecognizer {
    pub fn new(model_dir: impl Into<PathBuf>) -> Self {
        Self {
            model_dir: model_dir.into(),
            store: None,
            engine: Mutex::new(None),
        }
    }

    pub fn with_store(mut self, store: Arc<dyn StagingStore>) -> Self {
        self.store = Some(store);
        self
    }

    fn engine(&self) -> Result<Arc<OcrEngine>, DetectError> {
        let mut guard = self
            .engine
            .lock()
            .map_err(|_| DetectError::Backend("OCR engine lock poisoned".into()))?;
        if let Some(engine) = guard.as_ref() {
            return Ok(engine.clone());
        }

        info!(model_dir = %self.model_dir.display(), "initializing OCR engine");
        let engine = Arc::new(init_ocr_engine(&self.model_dir).map_err(|e| DetectError::Backend(e.into()))?);
        *guard = Some(engine.clone());
        Ok(engine)
    }
}

impl Detector for TextRecognizer {
    fn detect(&self, target: DecodeTarget<'_>) -> Result<Vec<RawDetection>, DetectError> {
        let image = resolve_raster(target, self.store.as_ref(), self.name())?;
        let engine = self.engine()?;

        let img = image.to_rgb8();
        let img_source = ImageSource::from_bytes(img.as_raw(), img.dimensions())
            .map_err(|e| DetectError::Backend(e.to_string().into()))?;
        let ocr_input = engine
            .prepare_input(img_source)
            .map_err(|e| DetectError::Backend(e.into()))?;

        let word_rects = engine
            .detect_words(&ocr_input)
            .map_err(|e| DetectError::Backend(e.into()))?;
        let line_rects = engine.find_text_lines(&ocr_input, &word_rects);
        let lines = engine
            .recognize_text(&ocr_input, &line_rects)
            .map_err(|e| DetectError::Backend(e.into()))?;

        Ok(lines
            .iter()
            .flatten()
            .map(|line| RawDetection::new(line.to_string().trim(), LINE_TAG))
            .collect())
    }

    fn name(&self) -> &str {
        "OCR Recognition"
    }
}

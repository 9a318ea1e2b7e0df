use image::DynamicImage;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::acquisition::{self, StagedObject, StagingStore};
use crate::config::StagingConfig;
use crate::detection::{DecodeTarget, DetectError, Detector};
use crate::error::{ErrorKind, ScanError, ScanResult};
use crate::handler::LambdaEvent;
use crate::models::{DetectionResult, ImageInput, RawDetection};
use crate::normalize::{NormalizePolicy, ResponseEnvelope, normalize};
use crate::validation::validate_event;

/// Context available to every pipeline stage
#[derive(Clone, Debug, Default)]
pub struct PipelineContext {
    pub verbose: bool,
}

impl PipelineContext {
    fn step(&self, step: &str, detail: &str) {
        if self.verbose {
            info!(step, "{}", detail);
        } else {
            debug!(step, "{}", detail);
        }
    }
}

/// Map a detector failure onto the pipeline taxonomy
fn classify_detect_error(detector: &str, err: DetectError) -> ScanError {
    match err {
        DetectError::Image(e) => {
            warn!(detector, error = %e, "detector could not decode image");
            ScanError::UnreadableImage(e.into())
        }
        other => {
            let detail = format!("{}", other);
            let cause = std::error::Error::source(&other)
                .map(|s| s.to_string())
                .unwrap_or_default();
            error!(detector, error = %detail, cause = %cause, "decode step failed");
            ScanError::DecodeServiceFailed(other.into())
        }
    }
}

/// Normalize raw detections; zero results is [`ScanError::NoDetections`]
fn finish(raw: Vec<RawDetection>, policy: NormalizePolicy) -> ScanResult<Vec<DetectionResult>> {
    let detections = normalize(raw, policy);
    if detections.is_empty() {
        return Err(ScanError::NoDetections);
    }
    Ok(detections)
}

/// Result of a local scan
#[derive(Debug, Clone)]
pub struct LocalScan {
    pub input: ImageInput,
    pub image: DynamicImage,
    pub detections: Vec<DetectionResult>,
}

/// Reads an image file and decodes it in-process
pub struct LocalPipeline {
    detector: Arc<dyn Detector>,
    context: PipelineContext,
    policy: NormalizePolicy,
}

impl LocalPipeline {
    pub fn new(detector: Arc<dyn Detector>) -> Self {
        Self {
            detector,
            context: PipelineContext::default(),
            policy: NormalizePolicy { skip_empty: true },
        }
    }

    /// Log each stage at info level instead of debug
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.context.verbose = verbose;
        self
    }

    pub fn run(&self, path: &Path) -> ScanResult<LocalScan> {
        self.context.step("acquire", &format!("read file '{}'", path.display()));
        let (input, image) = acquisition::load_local(path)?;
        self.context.step(
            "acquire",
            &format!("image loaded: {}x{}", image.width(), image.height()),
        );

        let detections = self.run_image(&image)?;
        Ok(LocalScan {
            input,
            image,
            detections,
        })
    }

    pub fn run_image(&self, image: &DynamicImage) -> ScanResult<Vec<DetectionResult>> {
        let name = self.detector.name();
        self.context.step("decode", &format!("running {}", name));
        let raw = self
            .detector
            .detect(DecodeTarget::Raster(image))
            .map_err(|e| classify_detect_error(name, e))?;
        self.context.step("decode", &format!("{} raw detections", raw.len()));

        finish(raw, self.policy)
    }
}

/// Result of a remote scan
#[derive(Debug, Clone)]
pub struct RemoteScan {
    pub object: StagedObject,
    pub detections: Vec<DetectionResult>,
}

/// Validates a request, stages its image and asks a detector to read the
/// staged object
pub struct RemotePipeline {
    store: Arc<dyn StagingStore>,
    detector: Arc<dyn Detector>,
    staging: StagingConfig,
    context: PipelineContext,
    policy: NormalizePolicy,
}

impl RemotePipeline {
    pub fn new(
        store: Arc<dyn StagingStore>,
        detector: Arc<dyn Detector>,
        staging: StagingConfig,
    ) -> Self {
        Self {
            store,
            detector,
            staging,
            context: PipelineContext::default(),
            policy: NormalizePolicy { skip_empty: false },
        }
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.context.verbose = verbose;
        self
    }

    /// Run every stage, stopping at the first failure
    pub fn execute(&self, event: &LambdaEvent) -> ScanResult<RemoteScan> {
        let input = validate_event(event)?;
        self.context
            .step("validate", &format!("decoded {} image bytes", input.len()));

        let object = acquisition::stage(&input, self.store.as_ref(), &self.staging)?;
        self.context.step("stage", &format!("staged as {}", object));

        let name = self.detector.name();
        let raw = self
            .detector
            .detect(DecodeTarget::Staged(&object))
            .map_err(|e| classify_detect_error(name, e))?;
        self.context.step("decode", &format!("{} raw detections", raw.len()));

        let detections = finish(raw, self.policy)?;
        Ok(RemoteScan { object, detections })
    }

    /// Run the pipeline and fold the outcome into an envelope
    pub fn handle(&self, event: &LambdaEvent) -> ResponseEnvelope {
        match self.execute(event) {
            Ok(scan) => ResponseEnvelope::success(scan.detections),
            Err(err) => {
                match err.kind() {
                    ErrorKind::StagingFailed | ErrorKind::DecodeServiceFailed => {
                        error!(kind = %err.kind(), detail = %err.detail(), "request failed")
                    }
                    kind => info!(%kind, "request rejected: {}", err),
                }
                ResponseEnvelope::error(&err)
            }
        }
    }
}

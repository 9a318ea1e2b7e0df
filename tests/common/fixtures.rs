use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use codescan::acquisition::{FsStagingStore, StagedObject, StagingStore};
use codescan::config::StagingConfig;
use codescan::detection::{DecodeTarget, DetectError, Detector};
use codescan::handler::LambdaEvent;
use codescan::{RawDetection, RemotePipeline};
use image::{DynamicImage, GrayImage, ImageBuffer, Luma, Rgb};
use rxing::{BarcodeFormat, MultiFormatWriter, Writer};
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use tempfile::NamedTempFile;

/// White border added around synthesized barcodes, in pixels
const QUIET_ZONE: u32 = 20;

/// Renders `contents` as a barcode of the given format on a white background.
pub fn barcode_image(contents: &str, format: BarcodeFormat, width: i32, height: i32) -> DynamicImage {
    let matrix = MultiFormatWriter::default()
        .encode(contents, &format, width, height)
        .expect("Failed to encode test barcode");
    let (w, h) = (matrix.getWidth(), matrix.getHeight());

    let mut img = GrayImage::from_pixel(w + 2 * QUIET_ZONE, h + 2 * QUIET_ZONE, Luma([255u8]));
    for y in 0..h {
        for x in 0..w {
            if matrix.get(x, y) {
                img.put_pixel(x + QUIET_ZONE, y + QUIET_ZONE, Luma([0u8]));
            }
        }
    }
    DynamicImage::ImageLuma8(img)
}

pub fn qr_image(contents: &str) -> DynamicImage {
    barcode_image(contents, BarcodeFormat::QR_CODE, 240, 240)
}

pub fn code128_image(contents: &str) -> DynamicImage {
    barcode_image(contents, BarcodeFormat::CODE_128, 400, 120)
}

/// A 200x200 white image with nothing on it
pub fn blank_image() -> DynamicImage {
    DynamicImage::ImageRgb8(ImageBuffer::from_pixel(200, 200, Rgb([255u8, 255u8, 255u8])))
}

pub fn png_bytes(img: &DynamicImage) -> Vec<u8> {
    let mut buf = Cursor::new(Vec::new());
    img.write_to(&mut buf, image::ImageFormat::Png)
        .expect("Failed to encode test image");
    buf.into_inner()
}

/// Saves the image to a temp .png file, removed when dropped.
pub fn write_png(img: &DynamicImage) -> NamedTempFile {
    let file = tempfile::Builder::new()
        .suffix(".png")
        .tempfile()
        .expect("Failed to create temp image file");
    img.save_with_format(file.path(), image::ImageFormat::Png)
        .expect("Failed to save test image");
    file
}

/// Event whose body is `{"img": "<base64 of bytes>"}`
pub fn image_event(bytes: &[u8]) -> LambdaEvent {
    let body = serde_json::json!({ "img": STANDARD.encode(bytes) }).to_string();
    LambdaEvent::with_body(body)
}

/// Staging config used across the remote tests
pub fn test_staging() -> StagingConfig {
    StagingConfig::new("ocr-zone", "uploaded")
}

/// Remote pipeline staging into a temp dir and decoding in-process.
/// Returns the temp dir too, which must be kept alive.
pub fn fs_remote_pipeline() -> (RemotePipeline, Arc<FsStagingStore>, tempfile::TempDir) {
    let dir = tempfile::TempDir::new().expect("Failed to create temp directory");
    let store = Arc::new(FsStagingStore::new(dir.path()));
    let detector = Arc::new(codescan::detection::BarcodeDecoder::with_store(store.clone()));
    let pipeline = RemotePipeline::new(store.clone(), detector, test_staging());
    (pipeline, store, dir)
}

/// Returns a fixed list of detections and counts its calls
pub struct FakeDetector {
    detections: Vec<RawDetection>,
    pub calls: AtomicUsize,
}

impl FakeDetector {
    pub fn new(detections: Vec<RawDetection>) -> Self {
        Self {
            detections,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Detector for FakeDetector {
    fn detect(&self, _target: DecodeTarget<'_>) -> Result<Vec<RawDetection>, DetectError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.detections.clone())
    }

    fn name(&self) -> &str {
        "Fake Detector"
    }
}

/// Always fails with a backend error carrying `secret` in its cause
pub struct FailingDetector {
    pub secret: String,
}

impl Detector for FailingDetector {
    fn detect(&self, _target: DecodeTarget<'_>) -> Result<Vec<RawDetection>, DetectError> {
        Err(DetectError::Backend(self.secret.clone().into()))
    }

    fn name(&self) -> &str {
        "Failing Detector"
    }
}

/// Store that rejects every upload
pub struct FailingStore;

impl StagingStore for FailingStore {
    fn upload(&self, _source: &Path, _object: &StagedObject) -> anyhow::Result<()> {
        anyhow::bail!("bucket unavailable: access denied for arn:internal")
    }

    fn fetch(&self, _object: &StagedObject) -> anyhow::Result<Vec<u8>> {
        anyhow::bail!("bucket unavailable")
    }

    fn name(&self) -> &str {
        "failing"
    }
}

/// Wraps a store and remembers which scratch files were uploaded from
pub struct RecordingStore<S> {
    pub inner: S,
    pub sources: Mutex<Vec<PathBuf>>,
    pub objects: Mutex<Vec<StagedObject>>,
}

impl<S: StagingStore> RecordingStore<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            sources: Mutex::new(Vec::new()),
            objects: Mutex::new(Vec::new()),
        }
    }
}

impl<S: StagingStore> StagingStore for RecordingStore<S> {
    fn upload(&self, source: &Path, object: &StagedObject) -> anyhow::Result<()> {
        assert!(source.exists(), "scratch file must exist during upload");
        self.sources.lock().unwrap().push(source.to_path_buf());
        self.objects.lock().unwrap().push(object.clone());
        self.inner.upload(source, object)
    }

    fn fetch(&self, object: &StagedObject) -> anyhow::Result<Vec<u8>> {
        self.inner.fetch(object)
    }

    fn name(&self) -> &str {
        "recording"
    }
}

/// Parses a response body into JSON for assertions
pub fn body_json(response: &codescan::LambdaResponse) -> serde_json::Value {
    serde_json::from_str(&response.body).expect("response body must be JSON")
}

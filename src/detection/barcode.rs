use image::DynamicImage;
use rxing::{Exceptions, RXingResult};
use std::sync::Arc;

use crate::acquisition::StagingStore;
use crate::detection::{DecodeTarget, DetectError, Detector, resolve_raster};
use crate::models::{Point, RawDetection};

/// In-process barcode decoding backed by `rxing`.
///
/// Reads rasters directly. Staged objects are readable only when the
/// decoder was built with a store to download them from.
#[derive(Default)]
pub struct BarcodeDecoder {
    store: Option<Arc<dyn StagingStore>>,
}

impl BarcodeDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_store(store: Arc<dyn StagingStore>) -> Self {
        Self { store: Some(store) }
    }
}

impl Detector for BarcodeDecoder {
    fn detect(&self, target: DecodeTarget<'_>) -> Result<Vec<RawDetection>, DetectError> {
        let image = resolve_raster(target, self.store.as_ref(), self.name())?;
        decode_barcodes(&image)
    }

    fn name(&self) -> &str {
        "Barcode Decoder"
    }
}

/// Decode every barcode the library finds in the image
pub fn decode_barcodes(image: &DynamicImage) -> Result<Vec<RawDetection>, DetectError> {
    let luma = image.to_luma8();
    let (width, height) = luma.dimensions();

    match rxing::helpers::detect_multiple_in_luma(luma.into_raw(), width, height) {
        Ok(results) => Ok(results.iter().map(to_raw_detection).collect()),
        // The library reports an image without barcodes as "not found"
        Err(Exceptions::NotFoundException(_)) => Ok(Vec::new()),
        Err(e) => Err(DetectError::Backend(e.to_string().into())),
    }
}

fn to_raw_detection(result: &RXingResult) -> RawDetection {
    // Format names come through as e.g. "QR_CODE" / "CODE_128"
    let kind = format!("{:?}", result.getBarcodeFormat());
    let outline: Vec<Point> = result.getPoints().iter().map(|p| Point::new(p.x, p.y)).collect();

    // Box is derived from the outline during normalization
    RawDetection::new(result.getText(), kind).with_polygon(outline)
}

pub mod barcode;
pub mod ocr;
pub mod remote;

pub use barcode::BarcodeDecoder;
pub use ocr::TextRecognizer;
pub use remote::RecognitionClient;

use image::DynamicImage;
use std::borrow::Cow;
use std::sync::Arc;

use crate::acquisition::{StagedObject, StagingStore};
use crate::error::BoxError;
use crate::models::RawDetection;

/// What a detector is asked to read
#[derive(Debug, Clone, Copy)]
pub enum DecodeTarget<'a> {
    /// An already decoded raster
    Raster(&'a DynamicImage),
    /// An image previously uploaded to the staging store
    Staged(&'a StagedObject),
}

impl DecodeTarget<'_> {
    pub fn describe(&self) -> &'static str {
        match self {
            Self::Raster(_) => "raster",
            Self::Staged(_) => "staged",
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum DetectError {
    #[error("{detector} cannot read {target} input")]
    UnsupportedTarget {
        detector: String,
        target: &'static str,
    },

    #[error("image could not be decoded")]
    Image(#[from] image::ImageError),

    #[error("detector backend failed")]
    Backend(#[source] BoxError),
}

/// External capability that turns an image into raw detections.
///
/// Implementations return detections in the order the backend reports them.
/// An empty vector means nothing was found; it is not an error here.
pub trait Detector: Send + Sync {
    fn detect(&self, target: DecodeTarget<'_>) -> Result<Vec<RawDetection>, DetectError>;

    /// Human-readable name (used in logs)
    fn name(&self) -> &str;
}

/// Get a raster for `target`, downloading staged objects through `store`
pub(crate) fn resolve_raster<'a>(
    target: DecodeTarget<'a>,
    store: Option<&Arc<dyn StagingStore>>,
    detector: &str,
) -> Result<Cow<'a, DynamicImage>, DetectError> {
    match (target, store) {
        (DecodeTarget::Raster(image), _) => Ok(Cow::Borrowed(image)),
        (DecodeTarget::Staged(object), Some(store)) => {
            let bytes = store.fetch(object).map_err(|e| DetectError::Backend(e.into()))?;
            Ok(Cow::Owned(image::load_from_memory(&bytes)?))
        }
        (target, None) => Err(DetectError::UnsupportedTarget {
            detector: detector.to_string(),
            target: target.describe(),
        }),
    }
}

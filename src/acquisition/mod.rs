pub mod store;

pub use store::{FsStagingStore, HttpStagingStore, StagedObject, StagingStore};

use image::{DynamicImage, ImageReader};
use std::io::{Cursor, Write};
use std::path::Path;
use tracing::{debug, error};

use crate::config::StagingConfig;
use crate::error::{ScanError, ScanResult};
use crate::models::{ImageInput, ImageSource};

/// Read an image file and decode it into a raster
pub fn load_local(path: &Path) -> ScanResult<(ImageInput, DynamicImage)> {
    let bytes = std::fs::read(path).map_err(|e| {
        debug!(path = %path.display(), error = %e, "failed to read image file");
        ScanError::UnreadableImage(e.into())
    })?;
    let input = ImageInput::new(ImageSource::File(path.to_path_buf()), bytes);
    let image = decode_raster(input.bytes())?;
    Ok((input, image))
}

/// Decode in-memory image bytes, guessing the format from its header
pub fn decode_raster(bytes: &[u8]) -> ScanResult<DynamicImage> {
    ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| ScanError::UnreadableImage(e.into()))?
        .decode()
        .map_err(|e| ScanError::UnreadableImage(e.into()))
}

/// Upload the image to the staging store under a fresh identifier.
///
/// The bytes go through a scratch file that is removed when this returns,
/// on success and on failure alike.
pub fn stage(
    input: &ImageInput,
    store: &dyn StagingStore,
    config: &StagingConfig,
) -> ScanResult<StagedObject> {
    if input.is_empty() {
        return Err(ScanError::StagingFailed("image payload is empty".into()));
    }

    let object = StagedObject::generate(config);

    let mut scratch = tempfile::Builder::new()
        .prefix("codescan-")
        .suffix(".png")
        .tempfile()
        .map_err(|e| staging_failed(&object, e.into()))?;
    scratch
        .write_all(input.bytes())
        .and_then(|_| scratch.flush())
        .map_err(|e| staging_failed(&object, e.into()))?;

    store
        .upload(scratch.path(), &object)
        .map_err(|e| staging_failed(&object, e))?;

    debug!(store = store.name(), %object, bytes = input.len(), "image staged");
    Ok(object)
}

fn staging_failed(object: &StagedObject, cause: anyhow::Error) -> ScanError {
    error!(%object, error = %format!("{:#}", cause), "staging failed");
    ScanError::StagingFailed(cause.into())
}

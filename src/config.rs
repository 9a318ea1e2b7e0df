use clap::Args;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_BUCKET: &str = "ocr-zone";
pub const DEFAULT_FOLDER: &str = "uploaded";

/// Where staged uploads go
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagingConfig {
    pub bucket: String,
    pub folder: String,
}

impl StagingConfig {
    pub fn new(bucket: impl Into<String>, folder: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            folder: folder.into(),
        }
    }

    /// Object key for a staged image: `<folder>/<id>.png`
    pub fn object_key(&self, id: &uuid::Uuid) -> String {
        let folder = self.folder.trim_matches('/');
        if folder.is_empty() {
            format!("{}.png", id)
        } else {
            format!("{}/{}.png", folder, id)
        }
    }
}

impl Default for StagingConfig {
    fn default() -> Self {
        Self::new(DEFAULT_BUCKET, DEFAULT_FOLDER)
    }
}

/// Staging and recognition settings shared by `invoke` and `serve`
#[derive(Debug, Clone, Args)]
pub struct ServiceArgs {
    /// Bucket receiving staged images
    #[arg(long, env = "CODESCAN_BUCKET", default_value = DEFAULT_BUCKET)]
    pub bucket: String,

    /// Folder (key prefix) inside the bucket
    #[arg(long, env = "CODESCAN_FOLDER", default_value = DEFAULT_FOLDER)]
    pub folder: String,

    /// Stage into this local directory instead of a remote object store
    #[arg(long, value_name = "DIR", env = "CODESCAN_STAGING_DIR", conflicts_with = "staging_endpoint")]
    pub staging_dir: Option<PathBuf>,

    /// S3-compatible endpoint for staged uploads (path-style)
    #[arg(long, value_name = "URL", env = "CODESCAN_STAGING_ENDPOINT")]
    pub staging_endpoint: Option<String>,

    /// Recognition service endpoint; when absent the staged image is
    /// decoded in-process
    #[arg(long, value_name = "URL", env = "CODESCAN_RECOGNITION_ENDPOINT")]
    pub recognition_endpoint: Option<String>,

    /// Run OCR text recognition in-process instead of barcode decoding
    #[arg(long, conflicts_with = "recognition_endpoint")]
    pub ocr: bool,

    /// Timeout for outbound HTTP requests, in seconds
    #[arg(long, value_name = "SECS", env = "CODESCAN_HTTP_TIMEOUT")]
    pub http_timeout: Option<u64>,
}

impl ServiceArgs {
    pub fn staging(&self) -> StagingConfig {
        StagingConfig::new(self.bucket.clone(), self.folder.clone())
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.http_timeout.map(Duration::from_secs)
    }
}

/// Listen address for `serve`
#[derive(Debug, Clone, Args)]
pub struct HttpArgs {
    #[arg(long, env = "CODESCAN_HTTP_HOST", default_value = "127.0.0.1")]
    pub host: String,

    #[arg(long, env = "CODESCAN_HTTP_PORT", default_value_t = 8080)]
    pub port: u16,
}

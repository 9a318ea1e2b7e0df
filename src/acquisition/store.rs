use anyhow::{Context, Result};
use reqwest::blocking::Client;
use reqwest::header::CONTENT_TYPE;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;
use uuid::Uuid;

use crate::config::StagingConfig;

/// Location of a staged image in object storage
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedObject {
    pub id: Uuid,
    pub bucket: String,
    pub key: String,
}

impl StagedObject {
    /// New location under a fresh random (v4) identifier
    pub fn generate(config: &StagingConfig) -> Self {
        let id = Uuid::new_v4();
        Self {
            id,
            bucket: config.bucket.clone(),
            key: config.object_key(&id),
        }
    }
}

impl std::fmt::Display for StagedObject {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.bucket, self.key)
    }
}

/// Durable storage that staged images are uploaded to and read back from
pub trait StagingStore: Send + Sync {
    /// Upload the file at `source` to `object`
    fn upload(&self, source: &Path, object: &StagedObject) -> Result<()>;

    /// Read back the bytes of a staged object
    fn fetch(&self, object: &StagedObject) -> Result<Vec<u8>>;

    fn name(&self) -> &str;
}

/// Directory-backed store: `<root>/<bucket>/<key>`
#[derive(Debug, Clone)]
pub struct FsStagingStore {
    root: PathBuf,
}

impl FsStagingStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path_of(&self, object: &StagedObject) -> PathBuf {
        let mut path = self.root.join(&object.bucket);
        for segment in object.key.split('/').filter(|s| !s.is_empty() && *s != "..") {
            path.push(segment);
        }
        path
    }
}

impl StagingStore for FsStagingStore {
    fn upload(&self, source: &Path, object: &StagedObject) -> Result<()> {
        let target = self.path_of(object);
        if let Some(parent) = target.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create staging directory {}", parent.display()))?;
        }
        std::fs::copy(source, &target)
            .with_context(|| format!("Failed to copy {} to {}", source.display(), target.display()))?;
        debug!(path = %target.display(), "staged image on disk");
        Ok(())
    }

    fn fetch(&self, object: &StagedObject) -> Result<Vec<u8>> {
        let path = self.path_of(object);
        std::fs::read(&path).with_context(|| format!("Failed to read staged object {}", path.display()))
    }

    fn name(&self) -> &str {
        "filesystem"
    }
}

/// S3-compatible store addressed path-style: `<endpoint>/<bucket>/<key>`
#[derive(Debug, Clone)]
pub struct HttpStagingStore {
    endpoint: String,
    client: Client,
}

impl HttpStagingStore {
    pub fn new(endpoint: impl Into<String>, timeout: Option<Duration>) -> Result<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self {
            endpoint: endpoint.into(),
            client: builder.build().context("Failed to build staging HTTP client")?,
        })
    }

    pub fn url_of(&self, object: &StagedObject) -> String {
        format!(
            "{}/{}/{}",
            self.endpoint.trim_end_matches('/'),
            object.bucket,
            object.key
        )
    }
}

impl StagingStore for HttpStagingStore {
    fn upload(&self, source: &Path, object: &StagedObject) -> Result<()> {
        let bytes = std::fs::read(source)
            .with_context(|| format!("Failed to read scratch file {}", source.display()))?;
        let url = self.url_of(object);
        self.client
            .put(&url)
            .header(CONTENT_TYPE, "image/png")
            .body(bytes)
            .send()
            .with_context(|| format!("PUT {} failed", url))?
            .error_for_status()
            .with_context(|| format!("PUT {} rejected", url))?;
        debug!(%url, "staged image over HTTP");
        Ok(())
    }

    fn fetch(&self, object: &StagedObject) -> Result<Vec<u8>> {
        let url = self.url_of(object);
        let response = self
            .client
            .get(&url)
            .send()
            .with_context(|| format!("GET {} failed", url))?
            .error_for_status()
            .with_context(|| format!("GET {} rejected", url))?;
        Ok(response.bytes()?.to_vec())
    }

    fn name(&self) -> &str {
        "http"
    }
}

use std::fmt;

pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Stable classification of a pipeline failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    MissingBody,
    InvalidFormat,
    MissingField,
    InvalidEncoding,
    UnreadableImage,
    NoDetections,
    StagingFailed,
    DecodeServiceFailed,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MissingBody => "MISSING_BODY",
            Self::InvalidFormat => "INVALID_FORMAT",
            Self::MissingField => "MISSING_FIELD",
            Self::InvalidEncoding => "INVALID_ENCODING",
            Self::UnreadableImage => "UNREADABLE_IMAGE",
            Self::NoDetections => "NO_DETECTIONS",
            Self::StagingFailed => "STAGING_FAILED",
            Self::DecodeServiceFailed => "DECODE_SERVICE_FAILED",
        }
    }

    /// HTTP-style status reported for this kind.
    ///
    /// 400 for malformed input, 422 for images that carry nothing usable,
    /// 502 when staging or the recognition service fails.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::MissingBody | Self::InvalidFormat | Self::MissingField | Self::InvalidEncoding => {
                400
            }
            Self::UnreadableImage | Self::NoDetections => 422,
            Self::StagingFailed | Self::DecodeServiceFailed => 502,
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Failure of a single pipeline invocation.
///
/// `Display` is the client-safe message; the `source` chain keeps the
/// underlying cause for logs.
#[derive(Debug, thiserror::Error)]
pub enum ScanError {
    #[error("body not exist.")]
    MissingBody,

    #[error("Invalid JSON.")]
    InvalidFormat(#[source] Option<serde_json::Error>),

    #[error("{field} is required.")]
    MissingField { field: &'static str },

    #[error("invalid base64 img")]
    InvalidEncoding(#[source] Option<base64::DecodeError>),

    #[error("unreadable image.")]
    UnreadableImage(#[source] BoxError),

    #[error("barcode not detected.")]
    NoDetections,

    #[error("failed uploading image")]
    StagingFailed(#[source] BoxError),

    #[error("failed scanning barcode")]
    DecodeServiceFailed(#[source] BoxError),
}

impl ScanError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::MissingBody => ErrorKind::MissingBody,
            Self::InvalidFormat(_) => ErrorKind::InvalidFormat,
            Self::MissingField { .. } => ErrorKind::MissingField,
            Self::InvalidEncoding(_) => ErrorKind::InvalidEncoding,
            Self::UnreadableImage(_) => ErrorKind::UnreadableImage,
            Self::NoDetections => ErrorKind::NoDetections,
            Self::StagingFailed(_) => ErrorKind::StagingFailed,
            Self::DecodeServiceFailed(_) => ErrorKind::DecodeServiceFailed,
        }
    }

    pub fn status_code(&self) -> u16 {
        self.kind().status_code()
    }

    /// Full cause chain, for logging only
    pub fn detail(&self) -> String {
        let mut out = self.to_string();
        let mut source = std::error::Error::source(self);
        while let Some(err) = source {
            out.push_str(": ");
            out.push_str(&err.to_string());
            source = err.source();
        }
        out
    }
}

pub type ScanResult<T> = std::result::Result<T, ScanError>;

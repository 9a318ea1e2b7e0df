pub mod acquisition;
pub mod annotate;
pub mod config;
pub mod detection;
pub mod error;
pub mod handler;
pub mod models;
pub mod normalize;
pub mod pipeline;
pub mod server;
pub mod telemetry;
pub mod validation;

pub use error::{ErrorKind, ScanError, ScanResult};
pub use models::{ArtifactType, BoundingBox, DetectionResult, ImageInput, ImageSource, RawDetection};
pub use detection::{DecodeTarget, DetectError, Detector};
pub use normalize::{NormalizePolicy, ResponseEnvelope};
pub use pipeline::{LocalPipeline, LocalScan, PipelineContext, RemotePipeline, RemoteScan};
pub use handler::{LambdaEvent, LambdaResponse};

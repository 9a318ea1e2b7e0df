#![allow(dead_code)]

mod fixtures;
mod loopback;
pub use fixtures::*;
pub use loopback::*;

// Re-export commonly used types from codescan for tests
pub use codescan::acquisition::{FsStagingStore, StagedObject, StagingStore};
pub use codescan::config::StagingConfig;
pub use codescan::detection::{BarcodeDecoder, DecodeTarget, DetectError, Detector};
pub use codescan::handler::{LambdaEvent, LambdaResponse, handle_event};
pub use codescan::{
    ArtifactType, DetectionResult, ErrorKind, LocalPipeline, RawDetection, RemotePipeline,
    ResponseEnvelope, ScanError,
};

use anyhow::Context;
use clap::{Parser, Subcommand};
use std::io::Read;
use std::path::PathBuf;
use std::sync::Arc;

use codescan::acquisition::{FsStagingStore, HttpStagingStore, StagingStore};
use codescan::config::{HttpArgs, ServiceArgs};
use codescan::detection::ocr::default_model_dir;
use codescan::detection::{BarcodeDecoder, Detector, RecognitionClient, TextRecognizer};
use codescan::handler::handle_raw_event;
use codescan::{LocalPipeline, RemotePipeline, ResponseEnvelope, annotate, server, telemetry};

#[derive(Parser)]
#[command(name = "codescan")]
#[command(about = "Read barcodes and text from images, locally or through staged recognition")]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Default log filter (RUST_LOG overrides it)
    #[arg(long, env = "CODESCAN_LOG", default_value = "warn", global = true)]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Decode barcodes in a local image file
    Scan {
        /// Path to input image file
        #[arg(value_name = "IMAGE")]
        image_path: PathBuf,

        /// Write a copy of the image with detections outlined
        #[arg(long, value_name = "PATH")]
        annotate: Option<PathBuf>,

        /// Print the response envelope as JSON instead of text lines
        #[arg(long)]
        json: bool,

        /// Recognize text lines instead of barcodes
        #[arg(long)]
        ocr: bool,

        /// Directory holding the OCR models (defaults to ~/.cache/ocrs)
        #[arg(long, value_name = "DIR", requires = "ocr")]
        model_dir: Option<PathBuf>,
    },

    /// Handle one proxy event (JSON) and print the response
    Invoke {
        /// Event file; reads stdin when omitted
        #[arg(long, value_name = "FILE")]
        event: Option<PathBuf>,

        #[command(flatten)]
        service: ServiceArgs,
    },

    /// Serve the remote pipeline over HTTP
    Serve {
        #[command(flatten)]
        http: HttpArgs,

        #[command(flatten)]
        service: ServiceArgs,
    },
}

fn main() -> anyhow::Result<()> {
    let args = Cli::parse();

    let level = if args.verbose { "info" } else { args.log_level.as_str() };
    // Logging is optional; results still go to stdout without it
    if let Err(e) = telemetry::init(level) {
        eprintln!("{:#}", e);
    }

    match args.command {
        Command::Scan {
            image_path,
            annotate,
            json,
            ocr,
            model_dir,
        } => {
            let detector: Arc<dyn Detector> = if ocr {
                let model_dir = match model_dir {
                    Some(dir) => dir,
                    None => default_model_dir()?,
                };
                Arc::new(TextRecognizer::new(model_dir))
            } else {
                Arc::new(BarcodeDecoder::new())
            };
            let pipeline = LocalPipeline::new(detector).with_verbose(args.verbose);
            run_scan(&pipeline, &image_path, annotate, json)
        }
        Command::Invoke { event, service } => {
            let pipeline = build_remote_pipeline(&service, args.verbose)?;
            let raw = match event {
                Some(path) => std::fs::read_to_string(&path)
                    .with_context(|| format!("Failed to read event file {}", path.display()))?,
                None => {
                    let mut buf = String::new();
                    std::io::stdin()
                        .read_to_string(&mut buf)
                        .context("Failed to read event from stdin")?;
                    buf
                }
            };
            let response = handle_raw_event(&pipeline, &raw);
            println!("{}", serde_json::to_string_pretty(&response)?);
            Ok(())
        }
        Command::Serve { http, service } => {
            let pipeline = Arc::new(build_remote_pipeline(&service, args.verbose)?);
            actix_web::rt::System::new().block_on(server::serve(pipeline, &http.host, http.port))
        }
    }
}

fn run_scan(
    pipeline: &LocalPipeline,
    image_path: &std::path::Path,
    annotate_out: Option<PathBuf>,
    json: bool,
) -> anyhow::Result<()> {
    let scan = match pipeline.run(image_path) {
        Ok(scan) => scan,
        Err(err) => {
            if json {
                println!("{}", ResponseEnvelope::error(&err).to_body()?);
            }
            return Err(err.into());
        }
    };

    if json {
        println!("{}", ResponseEnvelope::success(scan.detections.clone()).to_body()?);
    } else {
        for detection in &scan.detections {
            println!("value={} type={}", detection.detected_text, detection.kind);
        }
    }

    if let Some(out) = annotate_out {
        annotate::annotate(&scan.image, &scan.detections)
            .save(&out)
            .map_err(|e| anyhow::anyhow!("Failed to save annotated image: {}", e))?;
        tracing::info!(path = %out.display(), "annotated image written");
    }

    Ok(())
}

fn build_remote_pipeline(args: &ServiceArgs, verbose: bool) -> anyhow::Result<RemotePipeline> {
    let store: Arc<dyn StagingStore> = match (&args.staging_endpoint, &args.staging_dir) {
        (Some(endpoint), _) => Arc::new(HttpStagingStore::new(endpoint.clone(), args.timeout())?),
        (None, Some(dir)) => Arc::new(FsStagingStore::new(dir.clone())),
        (None, None) => Arc::new(FsStagingStore::new(std::env::temp_dir().join("codescan-staging"))),
    };

    let detector: Arc<dyn Detector> = if let Some(endpoint) = &args.recognition_endpoint {
        Arc::new(RecognitionClient::new(endpoint.clone(), args.timeout())?)
    } else if args.ocr {
        Arc::new(TextRecognizer::new(default_model_dir()?).with_store(store.clone()))
    } else {
        Arc::new(BarcodeDecoder::with_store(store.clone()))
    };

    tracing::info!(store = store.name(), detector = detector.name(), "remote pipeline ready");
    Ok(RemotePipeline::new(store, detector, args.staging()).with_verbose(verbose))
}

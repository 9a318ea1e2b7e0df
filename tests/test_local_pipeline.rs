//! Integration tests for the local (file → in-process decoder) pipeline.

mod common;

use std::sync::Arc;

use codescan::annotate::annotate;
use codescan::{BoundingBox, ImageSource};

use common::*;

fn barcode_pipeline() -> LocalPipeline {
    LocalPipeline::new(Arc::new(BarcodeDecoder::new()))
}

#[test]
fn test_qr_code_round_trip() -> anyhow::Result<()> {
    let file = write_png(&qr_image("SKU-000123"));

    let scan = barcode_pipeline().run(file.path())?;

    assert_eq!(scan.detections.len(), 1);
    assert_eq!(scan.detections[0].detected_text, "SKU-000123");
    assert_eq!(scan.detections[0].kind, ArtifactType::QrCode);
    assert!(scan.detections[0].bbox().is_some());
    // rxing reports finder pattern corners, which become the outline
    let geometry = scan.detections[0].geometry.as_ref().expect("geometry");
    assert!(geometry.polygon.len() >= 3);
    assert_eq!(scan.input.source(), &ImageSource::File(file.path().to_path_buf()));
    Ok(())
}

#[test]
fn test_code128_round_trip() -> anyhow::Result<()> {
    let file = write_png(&code128_image("WH01-BIN42"));

    let scan = barcode_pipeline().run(file.path())?;

    assert!(!scan.detections.is_empty());
    assert_eq!(scan.detections[0].detected_text, "WH01-BIN42");
    assert_eq!(scan.detections[0].kind, ArtifactType::Code128);
    Ok(())
}

#[test]
fn test_blank_image_reports_no_detections() {
    let file = write_png(&blank_image());

    let err = barcode_pipeline()
        .run(file.path())
        .expect_err("blank image must not produce detections");

    assert_eq!(err.kind(), ErrorKind::NoDetections);
    assert_eq!(err.to_string(), "barcode not detected.");
}

#[test]
fn test_corrupt_file_is_unreadable() -> anyhow::Result<()> {
    let file = tempfile::Builder::new().suffix(".png").tempfile()?;
    std::fs::write(file.path(), b"definitely not an image")?;

    let err = barcode_pipeline().run(file.path()).expect_err("garbage must fail");
    assert_eq!(err.kind(), ErrorKind::UnreadableImage);
    Ok(())
}

#[test]
fn test_missing_file_is_unreadable() -> anyhow::Result<()> {
    let dir = tempfile::TempDir::new()?;
    let err = barcode_pipeline()
        .run(&dir.path().join("nope.png"))
        .expect_err("missing file must fail");
    assert_eq!(err.kind(), ErrorKind::UnreadableImage);
    Ok(())
}

#[test]
fn test_empty_payloads_are_skipped() -> anyhow::Result<()> {
    let detector = Arc::new(FakeDetector::new(vec![
        RawDetection::new("", "CODE_128"),
        RawDetection::new("4006381333931", "EAN_13"),
    ]));
    let pipeline = LocalPipeline::new(detector.clone());

    let detections = pipeline.run_image(&blank_image())?;

    assert_eq!(detections.len(), 1);
    assert_eq!(detections[0].detected_text, "4006381333931");
    assert_eq!(detections[0].kind, ArtifactType::Ean13);
    assert_eq!(detector.call_count(), 1);
    Ok(())
}

#[test]
fn test_only_empty_payloads_is_no_detections() {
    let pipeline = LocalPipeline::new(Arc::new(FakeDetector::new(vec![RawDetection::new("", "QR_CODE")])));

    let err = pipeline.run_image(&blank_image()).expect_err("nothing usable");
    assert_eq!(err.kind(), ErrorKind::NoDetections);
}

#[test]
fn test_order_and_duplicates_are_preserved() -> anyhow::Result<()> {
    let pipeline = LocalPipeline::new(Arc::new(FakeDetector::new(vec![
        RawDetection::new("B", "QR_CODE"),
        RawDetection::new("A", "CODE_128"),
        RawDetection::new("B", "QR_CODE"),
    ])));

    let texts: Vec<String> = pipeline
        .run_image(&blank_image())?
        .into_iter()
        .map(|d| d.detected_text)
        .collect();

    assert_eq!(texts, vec!["B", "A", "B"]);
    Ok(())
}

#[test]
fn test_detector_image_error_is_unreadable() {
    struct BrokenImage;
    impl Detector for BrokenImage {
        fn detect(&self, _target: DecodeTarget<'_>) -> Result<Vec<RawDetection>, DetectError> {
            Err(image::load_from_memory(b"xx").unwrap_err().into())
        }
        fn name(&self) -> &str {
            "Broken"
        }
    }

    let err = LocalPipeline::new(Arc::new(BrokenImage))
        .run_image(&blank_image())
        .expect_err("image error must surface");
    assert_eq!(err.kind(), ErrorKind::UnreadableImage);
}

#[test]
fn test_annotation_outlines_detections() {
    let image = blank_image();
    let detection = DetectionResult {
        detected_text: "X".to_string(),
        kind: ArtifactType::QrCode,
        id: None,
        parent_id: None,
        confidence: None,
        geometry: Some(codescan::models::Geometry {
            bounding_box: BoundingBox {
                left: 50.0,
                top: 50.0,
                width: 60.0,
                height: 60.0,
            },
            polygon: Vec::new(),
        }),
    };

    let annotated = annotate(&image, &[detection]);

    assert_eq!(annotated.dimensions(), (200, 200));
    // Box is padded by 10px, so its top-left corner sits at (40, 40)
    assert_eq!(annotated.get_pixel(40, 40).0, [255, 0, 0]);
    assert_eq!(annotated.get_pixel(100, 100).0, [255, 255, 255]);
}

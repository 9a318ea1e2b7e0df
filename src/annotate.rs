use image::{DynamicImage, Rgb, RgbImage};
use imageproc::drawing::draw_hollow_rect_mut;
use imageproc::rect::Rect;

use crate::models::{BoundingBox, DetectionResult};

/// Margin drawn around each box, in pixels
pub const BOX_PADDING: i32 = 10;

const BOX_COLOR: Rgb<u8> = Rgb([255, 0, 0]);

/// Convert a detection box to pixel space.
///
/// Boxes reported as ratios of the image size are scaled up first.
pub fn pixel_rect(bbox: &BoundingBox, width: u32, height: u32) -> Rect {
    let (left, top, w, h) = if bbox.is_relative() {
        (
            bbox.left * width as f32,
            bbox.top * height as f32,
            bbox.width * width as f32,
            bbox.height * height as f32,
        )
    } else {
        (bbox.left, bbox.top, bbox.width, bbox.height)
    };

    let x = left.round() as i32 - BOX_PADDING;
    let y = top.round() as i32 - BOX_PADDING;
    let w = (w.round() as i32 + 2 * BOX_PADDING).max(1) as u32;
    let h = (h.round() as i32 + 2 * BOX_PADDING).max(1) as u32;
    Rect::at(x, y).of_size(w, h)
}

/// Draw a highlight rectangle around every detection that has geometry
pub fn annotate(image: &DynamicImage, detections: &[DetectionResult]) -> RgbImage {
    let mut canvas = image.to_rgb8();
    let (width, height) = canvas.dimensions();

    for bbox in detections.iter().filter_map(DetectionResult::bbox) {
        let rect = pixel_rect(bbox, width, height);
        draw_hollow_rect_mut(&mut canvas, rect, BOX_COLOR);
        // Second pass one pixel inside for a 2px stroke
        if rect.width() > 2 && rect.height() > 2 {
            let inner = Rect::at(rect.left() + 1, rect.top() + 1).of_size(rect.width() - 2, rect.height() - 2);
            draw_hollow_rect_mut(&mut canvas, inner, BOX_COLOR);
        }
    }

    canvas
}

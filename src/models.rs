use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Where the bytes of an [`ImageInput`] came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageSource {
    File(PathBuf),
    Base64,
}

/// Raw image bytes handed from acquisition to the decode step
#[derive(Debug, Clone)]
pub struct ImageInput {
    source: ImageSource,
    bytes: Vec<u8>,
}

impl ImageInput {
    pub fn new(source: ImageSource, bytes: Vec<u8>) -> Self {
        Self { source, bytes }
    }

    pub fn source(&self) -> &ImageSource {
        &self.source
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Bounding box of a detection.
///
/// Pixel coordinates for local decoders; recognition services may report
/// ratios of the image size instead. Only used for visualization.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct BoundingBox {
    pub left: f32,
    pub top: f32,
    pub width: f32,
    pub height: f32,
}

impl BoundingBox {
    /// Smallest box enclosing all points, `None` for an empty slice
    pub fn enclosing(points: &[Point]) -> Option<Self> {
        let (first, rest) = points.split_first()?;
        let (mut min_x, mut min_y) = (first.x, first.y);
        let (mut max_x, mut max_y) = (first.x, first.y);
        for &Point { x, y } in rest {
            min_x = min_x.min(x);
            min_y = min_y.min(y);
            max_x = max_x.max(x);
            max_y = max_y.max(y);
        }
        Some(Self {
            left: min_x,
            top: min_y,
            width: max_x - min_x,
            height: max_y - min_y,
        })
    }

    /// True when every edge lies within the unit square
    pub fn is_relative(&self) -> bool {
        self.left >= 0.0
            && self.top >= 0.0
            && self.left + self.width <= 1.0
            && self.top + self.height <= 1.0
    }
}

/// One corner of a detection outline
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Detection geometry: the enclosing box and, when reported, the outline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Geometry {
    pub bounding_box: BoundingBox,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub polygon: Vec<Point>,
}

impl Geometry {
    /// Geometry from an optional box and outline.
    ///
    /// A missing box is derived from the outline; with neither there is no
    /// geometry.
    pub fn from_parts(bounding_box: Option<BoundingBox>, polygon: Vec<Point>) -> Option<Self> {
        let bounding_box = bounding_box.or_else(|| BoundingBox::enclosing(&polygon))?;
        Some(Self {
            bounding_box,
            polygon,
        })
    }
}

/// Kind of artifact a decoder recognized
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ArtifactType {
    Code128,
    Code39,
    Code93,
    Ean13,
    Ean8,
    UpcA,
    UpcE,
    Itf,
    Codabar,
    QrCode,
    DataMatrix,
    Pdf417,
    Aztec,
    TextLine,
    TextWord,
    Other(String),
}

impl ArtifactType {
    /// Map a decoder or service type tag onto a known artifact type.
    ///
    /// Matching ignores case and separators, so `CODE_128`, `code128` and
    /// `Code-128` are the same tag.
    pub fn from_tag(tag: &str) -> Self {
        let folded: String = tag
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .map(|c| c.to_ascii_uppercase())
            .collect();
        match folded.as_str() {
            "CODE128" => Self::Code128,
            "CODE39" => Self::Code39,
            "CODE93" => Self::Code93,
            "EAN13" => Self::Ean13,
            "EAN8" => Self::Ean8,
            "UPCA" => Self::UpcA,
            "UPCE" => Self::UpcE,
            "ITF" | "I25" => Self::Itf,
            "CODABAR" => Self::Codabar,
            "QRCODE" | "QR" => Self::QrCode,
            "DATAMATRIX" => Self::DataMatrix,
            "PDF417" => Self::Pdf417,
            "AZTEC" => Self::Aztec,
            "LINE" | "TEXTLINE" => Self::TextLine,
            "WORD" | "TEXTWORD" => Self::TextWord,
            _ => Self::Other(tag.trim().to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Code128 => "CODE128",
            Self::Code39 => "CODE39",
            Self::Code93 => "CODE93",
            Self::Ean13 => "EAN13",
            Self::Ean8 => "EAN8",
            Self::UpcA => "UPC_A",
            Self::UpcE => "UPC_E",
            Self::Itf => "ITF",
            Self::Codabar => "CODABAR",
            Self::QrCode => "QRCODE",
            Self::DataMatrix => "DATA_MATRIX",
            Self::Pdf417 => "PDF417",
            Self::Aztec => "AZTEC",
            Self::TextLine => "TEXT_LINE",
            Self::TextWord => "TEXT_WORD",
            Self::Other(tag) => tag,
        }
    }
}

impl fmt::Display for ArtifactType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for ArtifactType {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ArtifactType {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let tag = String::deserialize(deserializer)?;
        Ok(Self::from_tag(&tag))
    }
}

/// Decoder-specific record before normalization
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawDetection {
    pub text: String,
    pub kind: String,
    pub id: Option<u32>,
    pub parent_id: Option<u32>,
    pub confidence: Option<f32>,
    pub bbox: Option<BoundingBox>,
    pub polygon: Vec<Point>,
}

impl RawDetection {
    pub fn new(text: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            kind: kind.into(),
            ..Default::default()
        }
    }

    pub fn with_bbox(mut self, bbox: BoundingBox) -> Self {
        self.bbox = Some(bbox);
        self
    }

    pub fn with_polygon(mut self, polygon: Vec<Point>) -> Self {
        self.polygon = polygon;
        self
    }

    pub fn with_confidence(mut self, confidence: f32) -> Self {
        self.confidence = Some(confidence);
        self
    }
}

/// One recognized barcode or text region, as returned to callers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DetectionResult {
    pub detected_text: String,
    #[serde(rename = "Type")]
    pub kind: ArtifactType,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub id: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub parent_id: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub confidence: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub geometry: Option<Geometry>,
}

impl DetectionResult {
    pub fn bbox(&self) -> Option<&BoundingBox> {
        self.geometry.as_ref().map(|g| &g.bounding_box)
    }
}

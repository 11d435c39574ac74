//! Sidecar backend: reads detections produced by an external detector.
//!
//! The external model (for example a YOLO runner) writes its output as JSON next to the
//! image, at `<image>.detections.json` or `<image stem>.json`. Two shapes are accepted:
//!
//! ```json
//! { "detections": [ { "label": "ppe", "confidence": 0.91, "box": [10, 20, 110, 220] } ] }
//! ```
//!
//! or a bare array of the same objects. An object may carry `"class": <index>` instead of
//! `"label"`, in which case the index is mapped through the hazard class order.

use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use serde::Deserialize;

use crate::detect::backend::DetectorBackend;
use crate::detect::result::{BoundingBox, Detection, DetectionResult};
use crate::frame::Frame;

const SIDECAR_SUFFIX: &str = "detections.json";

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum SidecarFile {
    Wrapped { detections: Vec<SidecarDetection> },
    Bare(Vec<SidecarDetection>),
}

#[derive(Debug, Deserialize)]
struct SidecarDetection {
    #[serde(default)]
    label: Option<String>,

    #[serde(default, rename = "class")]
    class_index: Option<usize>,

    /// Missing confidence means the detector already applied its own floor.
    #[serde(default = "full_confidence")]
    confidence: f32,

    #[serde(default, rename = "box")]
    bbox: Option<[f32; 4]>,
}

fn full_confidence() -> f32 {
    1.0
}

/// Parse a sidecar JSON payload.
///
/// Returns an error if the JSON is malformed or an entry has neither a label nor a class.
pub fn parse_sidecar(payload: &[u8]) -> Result<DetectionResult> {
    let file: SidecarFile =
        serde_json::from_slice(payload).map_err(|e| anyhow!("parse error: {}", e))?;
    let raw = match file {
        SidecarFile::Wrapped { detections } => detections,
        SidecarFile::Bare(detections) => detections,
    };

    let mut detections = Vec::with_capacity(raw.len());
    for entry in raw {
        let mut detection = match (entry.label, entry.class_index) {
            (Some(label), _) => Detection::new(label, entry.confidence),
            (None, Some(index)) => Detection::from_class_index(index, entry.confidence),
            (None, None) => return Err(anyhow!("detection has neither 'label' nor 'class'")),
        };
        if let Some([x1, y1, x2, y2]) = entry.bbox {
            detection = detection.with_bbox(BoundingBox { x1, y1, x2, y2 });
        }
        detections.push(detection);
    }
    Ok(DetectionResult::new(detections))
}

/// Backend that looks up the sidecar file of each frame's source path.
#[derive(Default)]
pub struct SidecarBackend;

impl SidecarBackend {
    pub fn new() -> Self {
        Self
    }

    /// Candidate sidecar paths for an image, in lookup order.
    pub fn candidates(image: &Path) -> Vec<PathBuf> {
        let mut with_suffix = image.as_os_str().to_owned();
        with_suffix.push(".");
        with_suffix.push(SIDECAR_SUFFIX);
        vec![PathBuf::from(with_suffix), image.with_extension("json")]
    }
}

impl DetectorBackend for SidecarBackend {
    fn name(&self) -> &'static str {
        "sidecar"
    }

    fn detect(&mut self, frame: &Frame) -> Result<DetectionResult> {
        let source = frame
            .source()
            .ok_or_else(|| anyhow!("sidecar detection requires a frame read from disk"))?;
        let path = Self::candidates(source)
            .into_iter()
            .find(|candidate| candidate.is_file())
            .ok_or_else(|| anyhow!("no detector output found for {}", source.display()))?;
        let payload = std::fs::read(&path)
            .with_context(|| format!("failed to read detector output {}", path.display()))?;
        parse_sidecar(&payload)
            .with_context(|| format!("invalid detector output {}", path.display()))
    }
}

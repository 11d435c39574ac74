use serde::Serialize;

use crate::hazard::{HazardLabel, HazardSet};

/// Result of running detection on a frame.
#[derive(Clone, Debug, Default, Serialize)]
pub struct DetectionResult {
    /// Every object the detector reported, including ones below the confidence floor.
    pub detections: Vec<Detection>,
}

impl DetectionResult {
    pub fn new(detections: Vec<Detection>) -> Self {
        Self { detections }
    }

    /// Collapse confident detections into a hazard set.
    ///
    /// Detections below `min_confidence` are dropped; unrecognized labels are skipped with
    /// a warning.
    pub fn hazards(&self, min_confidence: f32) -> HazardSet {
        HazardSet::from_names(
            self.detections
                .iter()
                .filter(|detection| detection.confidence >= min_confidence)
                .map(|detection| detection.label.as_str()),
        )
    }
}

/// One detected object.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Detection {
    /// Raw label name as emitted by the detector.
    pub label: String,
    pub confidence: f32,
    /// Pixel-space box, when the detector reports locations.
    pub bbox: Option<BoundingBox>,
}

impl Detection {
    pub fn new(label: impl Into<String>, confidence: f32) -> Self {
        Self {
            label: label.into(),
            confidence,
            bbox: None,
        }
    }

    /// Build from a detector class index, using the hazard class order.
    pub fn from_class_index(index: usize, confidence: f32) -> Self {
        let label = match HazardLabel::from_class_index(index) {
            Some(label) => label.as_str().to_string(),
            None => format!("class_{}", index),
        };
        Self::new(label, confidence)
    }

    pub fn with_bbox(mut self, bbox: BoundingBox) -> Self {
        self.bbox = Some(bbox);
        self
    }
}

/// Corner coordinates `(x1, y1)`-`(x2, y2)` in pixels.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct BoundingBox {
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hazards_filters_low_confidence_and_unknown_labels() {
        let result = DetectionResult::new(vec![
            Detection::new("ppe", 0.9),
            Detection::new("gas_cylinder", 0.2),
            Detection::new("forklift", 0.95),
            Detection::new("ppe", 0.5),
        ]);
        let hazards = result.hazards(0.4);
        assert_eq!(hazards.len(), 1);
        assert!(hazards.contains(HazardLabel::Ppe));
    }

    #[test]
    fn class_index_maps_to_hazard_order() {
        assert_eq!(Detection::from_class_index(2, 0.8).label, "industrial_fire");
        assert_eq!(Detection::from_class_index(9, 0.8).label, "class_9");
    }
}

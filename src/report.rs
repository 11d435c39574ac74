//! Safety report for one analyzed image.
//!
//! The core hands the report exactly four values: the image (identified by fingerprint and
//! source path), the hazard set, the risk score and the ordered action steps. Layout beyond
//! plain text and JSON belongs to whichever renderer consumes the JSON form.

use std::fmt::Write as _;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;

use crate::frame::Frame;
use crate::hazard::HazardSet;
use crate::plan::ActionStep;

pub const REPORT_TITLE: &str = "HazardEye Safety Report";

#[derive(Clone, Debug, Serialize)]
pub struct SafetyReport {
    pub title: String,
    pub image_fingerprint: String,
    pub image_source: Option<String>,
    /// `[width, height]` when the frame knew its size.
    pub image_size: Option<[u32; 2]>,
    pub hazards: HazardSet,
    pub risk_score: u32,
    pub action_plan: Vec<ActionStep>,
}

impl SafetyReport {
    pub fn new(frame: &Frame, hazards: &HazardSet, risk_score: u32, plan: &[ActionStep]) -> Self {
        Self {
            title: REPORT_TITLE.to_string(),
            image_fingerprint: frame.fingerprint_hex(),
            image_source: frame.source().map(|path| path.display().to_string()),
            image_size: frame.dimensions().map(|(width, height)| [width, height]),
            hazards: hazards.clone(),
            risk_score,
            action_plan: plan.to_vec(),
        }
    }

    pub fn render_text(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "{}", self.title);
        let _ = writeln!(out);
        if let Some(source) = &self.image_source {
            let _ = writeln!(out, "Image: {}", source);
        }
        if let Some([width, height]) = self.image_size {
            let _ = writeln!(out, "Image Size: {}x{}", width, height);
        }
        let _ = writeln!(out, "Image SHA-256: {}", self.image_fingerprint);
        let _ = writeln!(out, "Detected Hazards: {}", self.hazards.joined());
        let _ = writeln!(out, "Risk Score: {}", self.risk_score);
        let _ = writeln!(out);
        let _ = writeln!(out, "Action Plan:");
        for step in &self.action_plan {
            let _ = writeln!(out, "- {}", step.instruction);
        }
        out
    }

    pub fn render_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Write the report; a `.json` extension selects JSON, anything else plain text.
    pub fn write_to(&self, path: &Path) -> Result<()> {
        let body = match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => self.render_json()?,
            _ => self.render_text(),
        };
        std::fs::write(path, body)
            .with_context(|| format!("writing report to {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plan::ActionPlanner;
    use crate::risk::RiskEvaluator;

    fn report_for(names: &[&str]) -> SafetyReport {
        let frame = Frame::from_bytes(b"site photo".to_vec());
        let hazards = HazardSet::from_names(names.iter().copied());
        let assessment = RiskEvaluator::default().evaluate(&hazards);
        let plan = ActionPlanner::default().plan(&hazards, assessment.level);
        SafetyReport::new(&frame, &hazards, assessment.score, &plan)
    }

    #[test]
    fn text_report_lists_hazards_score_and_steps() {
        let text = report_for(&["electrical_fire", "industrial_fire"]).render_text();
        assert!(text.starts_with(REPORT_TITLE));
        assert!(text.contains("Detected Hazards: electrical_fire, industrial_fire"));
        assert!(text.contains("Risk Score: 90"));
        assert!(text.contains("- Cut power supply and use extinguisher"));
        assert!(text.ends_with("- Notify safety officer immediately\n"));
    }

    #[test]
    fn image_size_is_reported_when_known() {
        let hazards = HazardSet::from_names(["ppe"]);
        let frame = Frame::from_bytes(b"site photo".to_vec()).with_dimensions(640, 480);
        let report = SafetyReport::new(&frame, &hazards, 10, &[]);
        assert!(report.render_text().contains("Image Size: 640x480"));
        let value: serde_json::Value =
            serde_json::from_str(&report.render_json().expect("json")).expect("parse");
        assert_eq!(value["image_size"], serde_json::json!([640, 480]));

        let unsized_report = report_for(&["ppe"]);
        assert!(!unsized_report.render_text().contains("Image Size"));
        assert_eq!(unsized_report.image_size, None);
    }

    #[cfg(feature = "decode-image")]
    #[test]
    fn decoded_image_size_reaches_report() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("bay.png");
        image::RgbImage::new(8, 6).save(&path).expect("write png");

        let frame = Frame::open(&path).expect("open frame");
        let report = SafetyReport::new(&frame, &HazardSet::new(), 0, &[]);
        assert!(report.render_text().contains("Image Size: 8x6"));
    }

    #[test]
    fn json_report_round_trips_core_values() {
        let json = report_for(&["ppe"]).render_json().expect("json");
        let value: serde_json::Value = serde_json::from_str(&json).expect("parse");
        assert_eq!(value["risk_score"], 10);
        assert_eq!(value["hazards"][0], "ppe");
        assert_eq!(
            value["action_plan"][0]["instruction"],
            "Ensure workers wear proper PPE"
        );
    }

    #[test]
    fn write_to_picks_format_from_extension() {
        let dir = tempfile::tempdir().expect("temp dir");
        let report = report_for(&["gas_cylinder"]);

        let text_path = dir.path().join("report.txt");
        report.write_to(&text_path).expect("write text");
        let text = std::fs::read_to_string(&text_path).expect("read text");
        assert!(text.contains("Risk Score: 30"));

        let json_path = dir.path().join("report.json");
        report.write_to(&json_path).expect("write json");
        let json = std::fs::read_to_string(&json_path).expect("read json");
        assert!(json.contains("\"risk_score\": 30"));
    }
}

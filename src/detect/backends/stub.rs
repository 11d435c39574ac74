use anyhow::Result;

use crate::detect::backend::DetectorBackend;
use crate::detect::result::{Detection, DetectionResult};
use crate::frame::Frame;

/// Stub backend for testing and demos.
///
/// Replays a fixed script of label lists, one entry per frame, wrapping around at the end.
/// An empty script never detects anything.
pub struct StubBackend {
    script: Vec<Vec<String>>,
    cursor: usize,
}

impl StubBackend {
    pub fn new() -> Self {
        Self {
            script: Vec::new(),
            cursor: 0,
        }
    }

    /// Replay `script` frame by frame.
    pub fn scripted<I, F, S>(script: I) -> Self
    where
        I: IntoIterator<Item = F>,
        F: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            script: script
                .into_iter()
                .map(|frame| frame.into_iter().map(Into::into).collect())
                .collect(),
            cursor: 0,
        }
    }

    /// Report the same labels on every frame.
    pub fn fixed<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::scripted([labels])
    }

    /// Parse a script of the form `ppe;ppe,gas_cylinder;` (frames split by `;`, labels by `,`).
    pub fn from_script(script: &str) -> Self {
        Self::scripted(script.split(';').map(|frame| {
            frame
                .split(',')
                .map(str::trim)
                .filter(|label| !label.is_empty())
                .map(str::to_string)
                .collect::<Vec<_>>()
        }))
    }
}

impl Default for StubBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl DetectorBackend for StubBackend {
    fn name(&self) -> &'static str {
        "stub"
    }

    fn detect(&mut self, _frame: &Frame) -> Result<DetectionResult> {
        if self.script.is_empty() {
            return Ok(DetectionResult::default());
        }
        let labels = &self.script[self.cursor % self.script.len()];
        self.cursor = self.cursor.wrapping_add(1);
        Ok(DetectionResult::new(
            labels
                .iter()
                .map(|label| Detection::new(label.clone(), 1.0))
                .collect(),
        ))
    }
}

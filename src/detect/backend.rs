use anyhow::Result;

use crate::detect::result::DetectionResult;
use crate::frame::Frame;

/// Detector backend trait.
///
/// A backend turns one frame into zero or more labeled detections. The model behind it is
/// opaque to the rest of the crate; zero detections and labels outside the hazard catalog
/// are both valid output.
///
/// Implementations must treat the frame as read-only and must not keep it past the
/// `detect` call.
pub trait DetectorBackend: Send {
    /// Backend identifier.
    fn name(&self) -> &'static str;

    /// Run detection on a frame.
    fn detect(&mut self, frame: &Frame) -> Result<DetectionResult>;

    /// Optional warm-up hook.
    fn warm_up(&mut self) -> Result<()> {
        Ok(())
    }
}

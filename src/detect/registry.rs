use std::collections::BTreeMap;

use anyhow::{anyhow, Result};

use crate::detect::result::DetectionResult;
use crate::frame::Frame;

use super::backend::DetectorBackend;

/// Named detector backends, one of which is selected for detection.
///
/// The selection comes from configuration (`[detector] backend`, `HAZARD_DETECTOR`) or the
/// `--detector` flag, so an unknown name is a startup error listing what is available.
/// The registry is itself a `DetectorBackend` that forwards to the selected entry.
#[derive(Default)]
pub struct BackendRegistry {
    backends: BTreeMap<&'static str, Box<dyn DetectorBackend>>,
    selected: Option<&'static str>,
}

impl BackendRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a backend under its own name. A backend with the same name is replaced.
    pub fn register(&mut self, backend: Box<dyn DetectorBackend>) {
        let name = backend.name();
        if self.backends.insert(name, backend).is_some() {
            log::debug!("detector backend '{}' replaced", name);
        }
    }

    pub fn with<B: DetectorBackend + 'static>(mut self, backend: B) -> Self {
        self.register(Box::new(backend));
        self
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<&'static str> {
        self.backends.keys().copied().collect()
    }

    /// Select the backend used by `detect`. Matching ignores case and surrounding spaces.
    pub fn select(&mut self, name: &str) -> Result<()> {
        let wanted = name.trim();
        let found = self
            .backends
            .keys()
            .copied()
            .find(|known| known.eq_ignore_ascii_case(wanted))
            .ok_or_else(|| {
                anyhow!(
                    "unknown detector backend '{}' (available: {})",
                    wanted,
                    self.names().join(", ")
                )
            })?;
        self.selected = Some(found);
        Ok(())
    }

    pub fn selected(&self) -> Option<&'static str> {
        self.selected
    }

    fn selected_mut(&mut self) -> Result<&mut Box<dyn DetectorBackend>> {
        let name = self
            .selected
            .ok_or_else(|| anyhow!("no detector backend selected"))?;
        self.backends
            .get_mut(name)
            .ok_or_else(|| anyhow!("detector backend '{}' disappeared", name))
    }
}

impl DetectorBackend for BackendRegistry {
    fn name(&self) -> &'static str {
        self.selected.unwrap_or("registry")
    }

    fn detect(&mut self, frame: &Frame) -> Result<DetectionResult> {
        self.selected_mut()?.detect(frame)
    }

    fn warm_up(&mut self) -> Result<()> {
        self.selected_mut()?.warm_up()
    }
}

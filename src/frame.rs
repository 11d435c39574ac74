//! Image input for one evaluation cycle.
//!
//! - `Frame`: owned image bytes (an uploaded file or a captured frame) plus whatever
//!   metadata the source knows.
//!
//! Frames are read-only once built. Detectors receive `&Frame` and must not retain it past
//! the `detect` call.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use sha2::{Digest, Sha256};

/// Owned image bytes for one cycle.
#[derive(Clone, Debug)]
pub struct Frame {
    data: Vec<u8>,

    /// Pixel dimensions when known (decoded or supplied by the source).
    dimensions: Option<(u32, u32)>,

    /// File the frame was read from, if any.
    source: Option<PathBuf>,
}

impl Frame {
    /// Wrap in-memory image bytes.
    pub fn from_bytes(data: Vec<u8>) -> Self {
        Self {
            data,
            dimensions: None,
            source: None,
        }
    }

    pub fn with_dimensions(mut self, width: u32, height: u32) -> Self {
        self.dimensions = Some((width, height));
        self
    }

    /// Read an image file from disk.
    ///
    /// With the `decode-image` feature the image header is parsed for dimensions; a header
    /// that fails to parse is logged and the frame is still usable.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let data = std::fs::read(path)
            .with_context(|| format!("failed to read image {}", path.display()))?;
        Ok(Self {
            data,
            dimensions: probe_dimensions(path),
            source: Some(path.to_path_buf()),
        })
    }

    pub fn bytes(&self) -> &[u8] {
        &self.data
    }

    /// `(width, height)` in pixels, when known.
    pub fn dimensions(&self) -> Option<(u32, u32)> {
        self.dimensions
    }

    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    /// SHA-256 of the image bytes.
    pub fn fingerprint(&self) -> [u8; 32] {
        Sha256::digest(&self.data).into()
    }

    pub fn fingerprint_hex(&self) -> String {
        hex::encode(self.fingerprint())
    }
}

#[cfg(feature = "decode-image")]
fn probe_dimensions(path: &Path) -> Option<(u32, u32)> {
    match image::image_dimensions(path) {
        Ok(dimensions) => Some(dimensions),
        Err(err) => {
            log::warn!("could not read dimensions of {}: {}", path.display(), err);
            None
        }
    }
}

#[cfg(not(feature = "decode-image"))]
fn probe_dimensions(_path: &Path) -> Option<(u32, u32)> {
    None
}

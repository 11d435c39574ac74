mod backend;
mod backends;
mod registry;
mod result;

pub use backend::DetectorBackend;
pub use backends::{parse_sidecar, SidecarBackend, StubBackend};
pub use registry::BackendRegistry;
pub use result::{BoundingBox, Detection, DetectionResult};

pub mod sidecar;
pub mod stub;

pub use sidecar::{parse_sidecar, SidecarBackend};
pub use stub::StubBackend;

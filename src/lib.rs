//! HazardEye
//!
//! This crate implements the decision core of an industrial safety monitor: a detector
//! reports hazard labels for an image, and the core turns them into a risk score, a risk
//! level, an ordered action plan and a debounced alert decision.
//!
//! # Architecture
//!
//! The core holds these properties by construction:
//!
//! 1. **Closed label set**: hazards are a fixed enum; unknown detector labels weigh zero
//!    and never fail a cycle.
//! 2. **Set semantics**: a label counts once per cycle regardless of how many times the
//!    detector emits it.
//! 3. **Deterministic plans**: actions follow catalog order, never detector order, and the
//!    high-risk directive is always last.
//! 4. **Debounced alerts**: an unchanged hazard set never re-alerts until the session is
//!    restarted; a failed delivery is never recorded as alerted.
//!
//! # Module Structure
//!
//! - `hazard`, `catalog`: labels, hazard sets and the weight/action table
//! - `risk`, `plan`, `gate`: scoring, action planning, notification gate
//! - `detect`, `frame`: detector backends and image input
//! - `notify`, `report`: outbound collaborators
//! - `monitor`: per-session cycle driver
//! - `config`: file + environment configuration

pub mod catalog;
pub mod config;
pub mod detect;
pub mod frame;
pub mod gate;
pub mod hazard;
pub mod monitor;
pub mod notify;
pub mod plan;
pub mod report;
pub mod risk;

pub use catalog::{CatalogEntry, HazardCatalog};
pub use config::HazardConfig;
pub use detect::{
    BackendRegistry, BoundingBox, Detection, DetectionResult, DetectorBackend, SidecarBackend,
    StubBackend,
};
pub use frame::Frame;
pub use gate::{GateDecision, GatePhase, NotificationState, SharedNotificationState};
pub use hazard::{HazardLabel, HazardSet};
pub use monitor::{AlertStatus, Analysis, CycleOutcome, MonitoringSession};
pub use notify::{
    Alert, CommandVoice, ConsoleNotifier, ConsoleVoice, MqttNotifier, MqttSettings, Notifier,
    VoiceAnnouncer,
};
pub use plan::{ActionPlanner, ActionStep, ActionTrigger, HIGH_RISK_DIRECTIVE};
pub use report::SafetyReport;
pub use risk::{RiskAssessment, RiskEvaluator, RiskLevel, RiskThresholds};

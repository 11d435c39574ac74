//! Monitoring session: drives one evaluation cycle at a time.
//!
//! A cycle runs detection, scoring, planning and the notification decision start to
//! finish. The session owns the notification gate, so cycles are serialized by the `&mut`
//! receiver.

use anyhow::Result;
use serde::Serialize;

use crate::config::HazardConfig;
use crate::detect::DetectorBackend;
use crate::frame::Frame;
use crate::gate::{GateDecision, NotificationState};
use crate::hazard::HazardSet;
use crate::notify::{Alert, Notifier, VoiceAnnouncer};
use crate::plan::{ActionPlanner, ActionStep};
use crate::risk::{RiskAssessment, RiskEvaluator};

/// Scoring and planning for one hazard set.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Analysis {
    pub hazards: HazardSet,
    pub assessment: RiskAssessment,
    pub plan: Vec<ActionStep>,
}

/// What happened on the notification side of a cycle.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertStatus {
    /// Nothing detected, or the same hazards as the last alert.
    Suppressed,
    Delivered,
    /// The notifier failed; the gate was not advanced.
    DeliveryFailed(String),
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CycleOutcome {
    pub analysis: Analysis,
    pub alert: AlertStatus,
}

pub struct MonitoringSession {
    evaluator: RiskEvaluator,
    planner: ActionPlanner,
    min_confidence: f32,
    gate: NotificationState,
    notifier: Box<dyn Notifier>,
    voice: Box<dyn VoiceAnnouncer>,
    running: bool,
    cycles: u64,
}

impl MonitoringSession {
    pub fn new(
        config: &HazardConfig,
        notifier: Box<dyn Notifier>,
        voice: Box<dyn VoiceAnnouncer>,
    ) -> Self {
        let catalog = std::sync::Arc::new(config.catalog.clone());
        Self {
            evaluator: RiskEvaluator::new(catalog.clone(), config.thresholds),
            planner: ActionPlanner::new(catalog),
            min_confidence: config.min_confidence,
            gate: NotificationState::new(),
            notifier,
            voice,
            running: false,
            cycles: 0,
        }
    }

    /// Begin live monitoring. The gate is cleared so the first detection alerts.
    pub fn start(&mut self) {
        self.running = true;
        self.gate.reset();
        log::info!("monitoring started");
    }

    pub fn stop(&mut self) {
        self.running = false;
        self.gate.reset();
        log::info!("monitoring stopped after {} cycle(s)", self.cycles);
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn gate(&self) -> &NotificationState {
        &self.gate
    }

    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    /// Score and plan without touching the notification gate.
    pub fn analyze(&self, hazards: &HazardSet) -> Analysis {
        let assessment = self.evaluator.evaluate(hazards);
        let plan = self.planner.plan(hazards, assessment.level);
        Analysis {
            hazards: hazards.clone(),
            assessment,
            plan,
        }
    }

    /// Run one cycle over an already-detected hazard set.
    pub fn process_hazards(&mut self, hazards: HazardSet) -> CycleOutcome {
        self.cycles += 1;
        let analysis = self.analyze(&hazards);
        log::debug!(
            "cycle {}: hazards=[{}] score={} level={}",
            self.cycles,
            analysis.hazards,
            analysis.assessment.score,
            analysis.assessment.level
        );

        let alert = Alert {
            hazards,
            level: analysis.assessment.level,
            score: analysis.assessment.score,
        };
        let notifier = &mut self.notifier;
        let decision = self
            .gate
            .fire_if_changed(&alert.hazards, || notifier.deliver(&alert));

        let status = match decision {
            Ok(GateDecision::Suppressed) => AlertStatus::Suppressed,
            Ok(GateDecision::Fired) => {
                log::info!(
                    "alert sent via {}: {}",
                    self.notifier.name(),
                    alert.notification_text()
                );
                if let Err(err) = self.voice.speak(&alert.announcement_text()) {
                    log::warn!("voice announcement failed: {:#}", err);
                }
                AlertStatus::Delivered
            }
            Err(err) => {
                log::warn!(
                    "alert delivery via {} failed: {:#}",
                    self.notifier.name(),
                    err
                );
                AlertStatus::DeliveryFailed(format!("{:#}", err))
            }
        };

        CycleOutcome {
            analysis,
            alert: status,
        }
    }

    /// Run one cycle: detect, then `process_hazards`.
    ///
    /// A detector failure is returned before any state changes.
    pub fn process_frame(
        &mut self,
        detector: &mut dyn DetectorBackend,
        frame: &Frame,
    ) -> Result<CycleOutcome> {
        let result = detector.detect(frame)?;
        let hazards = result.hazards(self.min_confidence);
        Ok(self.process_hazards(hazards))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detect::{Detection, DetectionResult, StubBackend};
    use crate::hazard::HazardLabel;
    use crate::gate::GatePhase;
    use crate::notify::{ConsoleNotifier, ConsoleVoice};
    use anyhow::anyhow;

    struct FailingNotifier;

    impl Notifier for FailingNotifier {
        fn name(&self) -> &'static str {
            "failing"
        }

        fn deliver(&mut self, _alert: &Alert) -> Result<()> {
            Err(anyhow!("gateway timeout"))
        }
    }

    fn session() -> MonitoringSession {
        MonitoringSession::new(
            &HazardConfig::default(),
            Box::new(ConsoleNotifier),
            Box::new(ConsoleVoice),
        )
    }

    #[test]
    fn analyze_does_not_touch_gate() {
        let session = session();
        let analysis = session.analyze(&HazardSet::from_names(["ppe"]));
        assert_eq!(analysis.assessment.score, 10);
        assert_eq!(session.gate().phase(), GatePhase::Idle);
        assert_eq!(session.cycles(), 0);
    }

    #[test]
    fn start_and_stop_reset_gate() {
        let mut session = session();
        let hazards = HazardSet::from_names(["ppe"]);
        assert_eq!(
            session.process_hazards(hazards.clone()).alert,
            AlertStatus::Delivered
        );

        session.start();
        assert!(session.is_running());
        assert_eq!(
            session.process_hazards(hazards.clone()).alert,
            AlertStatus::Delivered
        );
        assert_eq!(
            session.process_hazards(hazards.clone()).alert,
            AlertStatus::Suppressed
        );

        session.stop();
        assert!(!session.is_running());
        assert_eq!(session.gate().phase(), GatePhase::Idle);
    }

    #[test]
    fn failed_delivery_is_reported_and_not_recorded() {
        let mut session = MonitoringSession::new(
            &HazardConfig::default(),
            Box::new(FailingNotifier),
            Box::new(ConsoleVoice),
        );
        let outcome = session.process_hazards(HazardSet::from_names(["gas_cylinder"]));
        match outcome.alert {
            AlertStatus::DeliveryFailed(reason) => assert!(reason.contains("gateway timeout")),
            other => panic!("expected delivery failure, got {other:?}"),
        }
        assert_eq!(session.gate().phase(), GatePhase::Idle);
        assert_eq!(outcome.analysis.assessment.score, 30);
    }

    /// Replays detections with their own confidences.
    struct ScoredDetector(Vec<Detection>);

    impl DetectorBackend for ScoredDetector {
        fn name(&self) -> &'static str {
            "scored"
        }

        fn detect(&mut self, _frame: &Frame) -> Result<DetectionResult> {
            Ok(DetectionResult::new(self.0.clone()))
        }
    }

    #[test]
    fn process_frame_applies_configured_confidence_floor() {
        let config = HazardConfig {
            min_confidence: 0.6,
            ..HazardConfig::default()
        };
        let mut strict =
            MonitoringSession::new(&config, Box::new(ConsoleNotifier), Box::new(ConsoleVoice));
        let mut detector = ScoredDetector(vec![
            Detection::new("ppe", 0.9),
            Detection::new("gas_cylinder", 0.5),
            Detection::new("industrial_fire", 0.6),
        ]);

        let outcome = strict
            .process_frame(&mut detector, &Frame::from_bytes(vec![7]))
            .expect("cycle");
        assert_eq!(
            outcome.analysis.hazards,
            HazardSet::from_names(["ppe", "industrial_fire"])
        );
        assert_eq!(outcome.analysis.assessment.score, 60);

        // The default floor (0.4) keeps the 0.5 detection.
        let mut lenient = session();
        let outcome = lenient
            .process_frame(&mut detector, &Frame::from_bytes(vec![7]))
            .expect("cycle");
        assert!(outcome.analysis.hazards.contains(HazardLabel::GasCylinder));
    }

    #[test]
    fn process_frame_drops_unknown_labels() {
        let mut session = session();
        let mut detector = StubBackend::fixed(["ppe", "unknown_thing"]);
        let outcome = session
            .process_frame(&mut detector, &Frame::from_bytes(vec![1, 2, 3]))
            .expect("cycle");
        assert_eq!(outcome.analysis.hazards, HazardSet::from_names(["ppe"]));
        assert_eq!(outcome.alert, AlertStatus::Delivered);
    }
}

use std::sync::{Arc, Mutex};

use anyhow::{anyhow, Result};

use hazard_eye::{
    Alert, AlertStatus, Frame, GatePhase, HazardConfig, HazardSet, MonitoringSession, Notifier,
    RiskLevel, SidecarBackend, StubBackend, VoiceAnnouncer,
};

/// Records delivered alerts; fails while `fail` is set.
#[derive(Clone, Default)]
struct RecordingNotifier {
    delivered: Arc<Mutex<Vec<Alert>>>,
    fail: Arc<Mutex<bool>>,
}

impl Notifier for RecordingNotifier {
    fn name(&self) -> &'static str {
        "recording"
    }

    fn deliver(&mut self, alert: &Alert) -> Result<()> {
        if *self.fail.lock().unwrap() {
            return Err(anyhow!("whatsapp gateway unreachable"));
        }
        self.delivered.lock().unwrap().push(alert.clone());
        Ok(())
    }
}

#[derive(Clone, Default)]
struct RecordingVoice {
    spoken: Arc<Mutex<Vec<String>>>,
}

impl VoiceAnnouncer for RecordingVoice {
    fn speak(&mut self, message: &str) -> Result<()> {
        self.spoken.lock().unwrap().push(message.to_string());
        Ok(())
    }
}

struct MuteVoice;

impl VoiceAnnouncer for MuteVoice {
    fn speak(&mut self, _message: &str) -> Result<()> {
        Err(anyhow!("audio device busy"))
    }
}

fn frame(index: usize) -> Frame {
    Frame::from_bytes(format!("frame-{index}").into_bytes())
}

#[test]
fn repeated_hazards_alert_once_until_set_changes() {
    let notifier = RecordingNotifier::default();
    let voice = RecordingVoice::default();
    let mut session = MonitoringSession::new(
        &HazardConfig::default(),
        Box::new(notifier.clone()),
        Box::new(voice.clone()),
    );
    let mut detector = StubBackend::from_script("ppe;ppe;ppe,gas_cylinder");
    session.start();

    let statuses: Vec<AlertStatus> = (0..3)
        .map(|i| {
            session
                .process_frame(&mut detector, &frame(i))
                .expect("cycle")
                .alert
        })
        .collect();
    assert_eq!(
        statuses,
        vec![
            AlertStatus::Delivered,
            AlertStatus::Suppressed,
            AlertStatus::Delivered
        ]
    );

    let delivered = notifier.delivered.lock().unwrap();
    assert_eq!(delivered.len(), 2);
    assert_eq!(delivered[0].hazards, HazardSet::from_names(["ppe"]));
    assert_eq!(delivered[0].level, RiskLevel::Low);
    assert_eq!(delivered[1].score, 40);
    assert_eq!(delivered[1].level, RiskLevel::Medium);

    let spoken = voice.spoken.lock().unwrap();
    assert_eq!(
        spoken.as_slice(),
        [
            "Attention! Low risk detected with hazards: ppe".to_string(),
            "Attention! Medium risk detected with hazards: gas_cylinder, ppe".to_string(),
        ]
    );
}

#[test]
fn failed_delivery_retries_on_next_identical_cycle() {
    let notifier = RecordingNotifier::default();
    let voice = RecordingVoice::default();
    let mut session = MonitoringSession::new(
        &HazardConfig::default(),
        Box::new(notifier.clone()),
        Box::new(voice.clone()),
    );
    let hazards = HazardSet::from_names(["industrial_fire"]);

    *notifier.fail.lock().unwrap() = true;
    let outcome = session.process_hazards(hazards.clone());
    assert!(matches!(outcome.alert, AlertStatus::DeliveryFailed(_)));
    assert_eq!(outcome.analysis.assessment.level, RiskLevel::High);
    assert_eq!(session.gate().phase(), GatePhase::Idle);
    assert!(voice.spoken.lock().unwrap().is_empty());

    *notifier.fail.lock().unwrap() = false;
    let outcome = session.process_hazards(hazards.clone());
    assert_eq!(outcome.alert, AlertStatus::Delivered);
    assert_eq!(session.gate().phase(), GatePhase::Alerted(&hazards));
    assert_eq!(notifier.delivered.lock().unwrap().len(), 1);
}

#[test]
fn voice_failure_keeps_alert_recorded() {
    let notifier = RecordingNotifier::default();
    let mut session = MonitoringSession::new(
        &HazardConfig::default(),
        Box::new(notifier.clone()),
        Box::new(MuteVoice),
    );
    let hazards = HazardSet::from_names(["electrical_fire"]);

    assert_eq!(
        session.process_hazards(hazards.clone()).alert,
        AlertStatus::Delivered
    );
    assert_eq!(
        session.process_hazards(hazards).alert,
        AlertStatus::Suppressed
    );
    assert_eq!(notifier.delivered.lock().unwrap().len(), 1);
}

#[test]
fn empty_cycles_never_alert() {
    let notifier = RecordingNotifier::default();
    let mut session = MonitoringSession::new(
        &HazardConfig::default(),
        Box::new(notifier.clone()),
        Box::new(RecordingVoice::default()),
    );
    let mut detector = StubBackend::from_script(";forklift;");

    for i in 0..3 {
        let outcome = session
            .process_frame(&mut detector, &frame(i))
            .expect("cycle");
        assert!(outcome.analysis.hazards.is_empty());
        assert_eq!(outcome.analysis.assessment.score, 0);
        assert!(outcome.analysis.plan.is_empty());
        assert_eq!(outcome.alert, AlertStatus::Suppressed);
    }
    assert!(notifier.delivered.lock().unwrap().is_empty());
    assert_eq!(session.cycles(), 3);
}

#[test]
fn restart_realerts_same_hazards() {
    let notifier = RecordingNotifier::default();
    let mut session = MonitoringSession::new(
        &HazardConfig::default(),
        Box::new(notifier.clone()),
        Box::new(RecordingVoice::default()),
    );
    let hazards = HazardSet::from_names(["gas_cylinder"]);

    session.start();
    session.process_hazards(hazards.clone());
    session.stop();
    session.start();
    assert_eq!(
        session.process_hazards(hazards).alert,
        AlertStatus::Delivered
    );
    assert_eq!(notifier.delivered.lock().unwrap().len(), 2);
}

#[test]
fn detector_failure_leaves_gate_untouched() {
    struct BrokenDetector;

    impl hazard_eye::DetectorBackend for BrokenDetector {
        fn name(&self) -> &'static str {
            "broken"
        }

        fn detect(&mut self, _frame: &Frame) -> Result<hazard_eye::DetectionResult> {
            Err(anyhow!("model not loaded"))
        }
    }

    let mut session = MonitoringSession::new(
        &HazardConfig::default(),
        Box::new(RecordingNotifier::default()),
        Box::new(RecordingVoice::default()),
    );
    session.process_hazards(HazardSet::from_names(["ppe"]));

    let err = session
        .process_frame(&mut BrokenDetector, &frame(0))
        .unwrap_err();
    assert!(err.to_string().contains("model not loaded"));
    assert_eq!(session.cycles(), 1);
    assert_eq!(
        session.gate().last_alerted(),
        &HazardSet::from_names(["ppe"])
    );
}

#[test]
fn sidecar_detections_below_configured_confidence_are_ignored() {
    let dir = tempfile::tempdir().expect("temp dir");
    let image = dir.path().join("bay-2.jpg");
    std::fs::write(&image, b"jpeg bytes").expect("write image");
    std::fs::write(
        dir.path().join("bay-2.jpg.detections.json"),
        r#"{"detections": [
            {"label": "ppe", "confidence": 0.9},
            {"label": "gas_cylinder", "confidence": 0.5}
        ]}"#,
    )
    .expect("write detections");

    let config = HazardConfig {
        min_confidence: 0.6,
        ..HazardConfig::default()
    };
    let notifier = RecordingNotifier::default();
    let mut session = MonitoringSession::new(
        &config,
        Box::new(notifier.clone()),
        Box::new(RecordingVoice::default()),
    );

    let outcome = session
        .process_frame(&mut SidecarBackend::new(), &Frame::open(&image).expect("frame"))
        .expect("cycle");
    assert_eq!(outcome.analysis.hazards, HazardSet::from_names(["ppe"]));
    assert_eq!(outcome.analysis.assessment.score, 10);
    assert_eq!(
        notifier.delivered.lock().unwrap()[0].hazards,
        HazardSet::from_names(["ppe"])
    );
}

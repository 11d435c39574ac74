use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use std::path::Path;

use crate::catalog::{CatalogEntry, HazardCatalog};
use crate::hazard::HazardLabel;
use crate::notify::{parse_broker_addr, MqttSettings};
use crate::risk::{RiskThresholds, DEFAULT_HIGH_THRESHOLD, DEFAULT_MEDIUM_THRESHOLD};

const DEFAULT_MIN_CONFIDENCE: f32 = 0.4;
const DEFAULT_DETECTOR_BACKEND: &str = "sidecar";
const DEFAULT_MQTT_CLIENT_ID: &str = "hazardeye";
const DEFAULT_MQTT_TOPIC_PREFIX: &str = "hazardeye";

#[derive(Debug, Deserialize, Default)]
struct HazardConfigFile {
    catalog: Option<Vec<CatalogEntryFile>>,
    thresholds: Option<ThresholdsFile>,
    detector: Option<DetectorConfigFile>,
    notify: Option<NotifyConfigFile>,
}

#[derive(Debug, Deserialize)]
struct CatalogEntryFile {
    label: String,
    weight: i64,
    action: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
struct ThresholdsFile {
    medium: Option<i64>,
    high: Option<i64>,
}

#[derive(Debug, Deserialize, Default)]
struct DetectorConfigFile {
    backend: Option<String>,
    min_confidence: Option<f32>,
}

#[derive(Debug, Deserialize, Default)]
struct NotifyConfigFile {
    mqtt: Option<MqttConfigFile>,
    voice_command: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
struct MqttConfigFile {
    broker_addr: Option<String>,
    client_id: Option<String>,
    topic_prefix: Option<String>,
    username: Option<String>,
    password: Option<String>,
}

/// Effective configuration: scoring policy plus boundary settings.
#[derive(Debug, Clone)]
pub struct HazardConfig {
    pub catalog: HazardCatalog,
    pub thresholds: RiskThresholds,
    /// Name of the detector backend to select.
    pub detector_backend: String,
    /// Detections below this confidence are ignored.
    pub min_confidence: f32,
    /// MQTT delivery; `None` means alerts only go to the log.
    pub mqtt: Option<MqttSettings>,
    /// Text-to-speech command line; `None` means announcements only go to the log.
    pub voice_command: Option<String>,
}

impl Default for HazardConfig {
    fn default() -> Self {
        Self {
            catalog: HazardCatalog::default(),
            thresholds: RiskThresholds::default(),
            detector_backend: DEFAULT_DETECTOR_BACKEND.to_string(),
            min_confidence: DEFAULT_MIN_CONFIDENCE,
            mqtt: None,
            voice_command: None,
        }
    }
}

impl HazardConfig {
    /// Load from `HAZARD_CONFIG` (if set), apply env overrides, validate.
    pub fn load() -> Result<Self> {
        let config_path = std::env::var("HAZARD_CONFIG").ok();
        Self::load_from(config_path.as_deref().map(Path::new))
    }

    /// Like `load`, with an explicit file path taking the place of `HAZARD_CONFIG`.
    pub fn load_from(path: Option<&Path>) -> Result<Self> {
        let file_cfg = match path {
            Some(path) => Some(read_config_file(path)?),
            None => None,
        };
        let mut cfg = Self::from_file(file_cfg.unwrap_or_default())?;
        cfg.apply_env()?;
        cfg.validate()?;
        Ok(cfg)
    }

    fn from_file(file: HazardConfigFile) -> Result<Self> {
        let overrides = file
            .catalog
            .unwrap_or_default()
            .into_iter()
            .map(catalog_entry_from_file)
            .collect::<Result<Vec<_>>>()?;
        let catalog = HazardCatalog::with_overrides(overrides)?;

        let thresholds_file = file.thresholds.unwrap_or_default();
        let thresholds = RiskThresholds {
            medium: threshold_from_file(
                "medium",
                thresholds_file.medium,
                DEFAULT_MEDIUM_THRESHOLD,
            )?,
            high: threshold_from_file("high", thresholds_file.high, DEFAULT_HIGH_THRESHOLD)?,
        };

        let detector = file.detector.unwrap_or_default();
        let min_confidence = detector.min_confidence.unwrap_or(DEFAULT_MIN_CONFIDENCE);
        let detector_backend = detector
            .backend
            .unwrap_or_else(|| DEFAULT_DETECTOR_BACKEND.to_string());

        // A section without broker_addr may still be completed by HAZARD_MQTT_BROKER_ADDR;
        // validate() rejects it otherwise.
        let notify = file.notify.unwrap_or_default();
        let mqtt = notify.mqtt.map(|mqtt| MqttSettings {
            broker_addr: mqtt.broker_addr.unwrap_or_default(),
            client_id: mqtt
                .client_id
                .unwrap_or_else(|| DEFAULT_MQTT_CLIENT_ID.to_string()),
            topic_prefix: mqtt
                .topic_prefix
                .unwrap_or_else(|| DEFAULT_MQTT_TOPIC_PREFIX.to_string()),
            username: mqtt.username,
            password: mqtt.password,
        });

        Ok(Self {
            catalog,
            thresholds,
            detector_backend,
            min_confidence,
            mqtt,
            voice_command: notify.voice_command,
        })
    }

    fn apply_env(&mut self) -> Result<()> {
        if let Ok(value) = std::env::var("HAZARD_MEDIUM_THRESHOLD") {
            self.thresholds.medium = value
                .trim()
                .parse()
                .map_err(|_| anyhow!("HAZARD_MEDIUM_THRESHOLD must be a non-negative integer"))?;
        }
        if let Ok(value) = std::env::var("HAZARD_HIGH_THRESHOLD") {
            self.thresholds.high = value
                .trim()
                .parse()
                .map_err(|_| anyhow!("HAZARD_HIGH_THRESHOLD must be a non-negative integer"))?;
        }
        if let Ok(backend) = std::env::var("HAZARD_DETECTOR") {
            if !backend.trim().is_empty() {
                self.detector_backend = backend;
            }
        }
        if let Ok(value) = std::env::var("HAZARD_MIN_CONFIDENCE") {
            self.min_confidence = value
                .trim()
                .parse()
                .map_err(|_| anyhow!("HAZARD_MIN_CONFIDENCE must be a number"))?;
        }
        if let Ok(addr) = std::env::var("HAZARD_MQTT_BROKER_ADDR") {
            if !addr.trim().is_empty() {
                match &mut self.mqtt {
                    Some(mqtt) => mqtt.broker_addr = addr,
                    None => {
                        self.mqtt = Some(MqttSettings {
                            broker_addr: addr,
                            client_id: DEFAULT_MQTT_CLIENT_ID.to_string(),
                            topic_prefix: DEFAULT_MQTT_TOPIC_PREFIX.to_string(),
                            username: None,
                            password: None,
                        })
                    }
                }
            }
        }
        if let Ok(prefix) = std::env::var("HAZARD_MQTT_TOPIC_PREFIX") {
            if !prefix.trim().is_empty() {
                let mqtt = self.mqtt.as_mut().ok_or_else(|| {
                    anyhow!(
                        "HAZARD_MQTT_TOPIC_PREFIX is set but no MQTT broker is configured \
                         (set HAZARD_MQTT_BROKER_ADDR or [notify.mqtt] broker_addr)"
                    )
                })?;
                mqtt.topic_prefix = prefix;
            }
        }
        if let Ok(command) = std::env::var("HAZARD_VOICE_COMMAND") {
            if !command.trim().is_empty() {
                self.voice_command = Some(command);
            }
        }
        Ok(())
    }

    fn validate(&mut self) -> Result<()> {
        self.thresholds = RiskThresholds::new(self.thresholds.medium, self.thresholds.high)?;

        if !(0.0..=1.0).contains(&self.min_confidence) {
            return Err(anyhow!(
                "min_confidence must be within [0, 1], got {}",
                self.min_confidence
            ));
        }
        if self.detector_backend.trim().is_empty() {
            return Err(anyhow!("detector backend must not be empty"));
        }
        if let Some(mqtt) = &self.mqtt {
            if mqtt.broker_addr.trim().is_empty() {
                return Err(anyhow!("[notify.mqtt] requires broker_addr"));
            }
            parse_broker_addr(&mqtt.broker_addr)?;
            if mqtt.topic_prefix.trim().is_empty() {
                return Err(anyhow!("mqtt topic_prefix must not be empty"));
            }
        }
        Ok(())
    }
}

fn catalog_entry_from_file(entry: CatalogEntryFile) -> Result<CatalogEntry> {
    let label: HazardLabel = entry.label.parse()?;
    let weight = u32::try_from(entry.weight).map_err(|_| {
        anyhow!(
            "catalog weight for '{}' must be a non-negative integer, got {}",
            label,
            entry.weight
        )
    })?;
    Ok(CatalogEntry {
        label,
        weight,
        action: entry.action.filter(|action| !action.trim().is_empty()),
    })
}

fn threshold_from_file(name: &str, value: Option<i64>, default: u32) -> Result<u32> {
    match value {
        Some(value) => u32::try_from(value)
            .map_err(|_| anyhow!("{} threshold must be a non-negative integer, got {}", name, value)),
        None => Ok(default),
    }
}

fn read_config_file(path: &Path) -> Result<HazardConfigFile> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config file {}", path.display()))?;
    let is_json = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
    let cfg = if is_json {
        serde_json::from_str(&raw)
            .map_err(|e| anyhow!("invalid config file {}: {}", path.display(), e))?
    } else {
        toml::from_str(&raw).map_err(|e| anyhow!("invalid config file {}: {}", path.display(), e))?
    };
    Ok(cfg)
}

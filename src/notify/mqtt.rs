//! MQTT alert delivery.
//!
//! Alerts are published as JSON with QoS 1 to `<topic_prefix>/alert`. The connection event
//! loop runs on a background thread for the lifetime of the notifier and reconnects with
//! a capped exponential backoff.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use anyhow::{anyhow, Context, Result};
use rumqttc::v5::{mqttbytes::QoS, Client, Connection, Event, Incoming, MqttOptions};
use rumqttc::Outgoing;
use serde::Serialize;

use super::{Alert, Notifier};

const ALERT_TOPIC_SUFFIX: &str = "alert";
const RECONNECT_DELAY_MIN: Duration = Duration::from_secs(1);
const RECONNECT_DELAY_MAX: Duration = Duration::from_secs(30);
const STOP_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Broker connection settings.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MqttSettings {
    pub broker_addr: String,
    pub client_id: String,
    pub topic_prefix: String,
    pub username: Option<String>,
    pub password: Option<String>,
}

/// Alert payload as published on the wire.
#[derive(Serialize)]
struct AlertPayload<'a> {
    risk_level: &'a str,
    hazards: Vec<&'static str>,
    score: u32,
    message: String,
    timestamp: u64,
}

impl<'a> AlertPayload<'a> {
    fn from_alert(alert: &'a Alert, timestamp: u64) -> Self {
        Self {
            risk_level: alert.level.as_str(),
            hazards: alert.hazards.iter().map(|label| label.as_str()).collect(),
            score: alert.score,
            message: alert.notification_text(),
            timestamp,
        }
    }
}

/// Publishes alerts to an MQTT broker.
///
/// The event loop keeps polling after connection errors, so rumqttc reconnects once the
/// broker is reachable again. Publishing never blocks a cycle: a full request queue is
/// reported as a delivery failure and the alert is retried by the gate.
pub struct MqttNotifier {
    client: Client,
    topic: String,
    stopping: Arc<AtomicBool>,
    connection_handle: Option<std::thread::JoinHandle<()>>,
}

impl MqttNotifier {
    pub fn connect(settings: &MqttSettings) -> Result<Self> {
        let (host, port) = parse_broker_addr(&settings.broker_addr)?;
        let mut options = MqttOptions::new(settings.client_id.clone(), host, port);
        options.set_keep_alive(Duration::from_secs(60));
        options.set_clean_start(true);
        if let Some(user) = settings.username.as_deref() {
            options.set_credentials(user, settings.password.as_deref().unwrap_or_default());
        }

        let (client, connection) = Client::new(options, 10);
        log::info!(
            "MQTT notifier configured for {} (auth: {})",
            settings.broker_addr,
            settings.username.is_some()
        );
        let stopping = Arc::new(AtomicBool::new(false));
        Ok(Self {
            client,
            topic: alert_topic(&settings.topic_prefix),
            connection_handle: Some(spawn_event_loop(connection, stopping.clone())),
            stopping,
        })
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// True while the background event loop is still polling.
    pub fn is_polling(&self) -> bool {
        self.connection_handle
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    pub fn disconnect(self) -> Result<()> {
        let Self {
            client,
            stopping,
            mut connection_handle,
            ..
        } = self;
        stopping.store(true, Ordering::SeqCst);
        let result = client.disconnect();
        drop(client);
        if let Some(handle) = connection_handle.take() {
            let _ = handle.join();
        }
        result?;
        Ok(())
    }
}

impl Notifier for MqttNotifier {
    fn name(&self) -> &'static str {
        "mqtt"
    }

    fn deliver(&mut self, alert: &Alert) -> Result<()> {
        if !self.is_polling() {
            return Err(anyhow!("MQTT event loop is not running"));
        }
        let payload = serde_json::to_vec(&AlertPayload::from_alert(alert, unix_now()))?;
        self.client
            .try_publish(self.topic.clone(), QoS::AtLeastOnce, false, payload)
            .with_context(|| format!("failed to publish alert to {}", self.topic))?;
        Ok(())
    }
}

fn spawn_event_loop(
    mut connection: Connection,
    stopping: Arc<AtomicBool>,
) -> std::thread::JoinHandle<()> {
    std::thread::spawn(move || {
        let mut delay = RECONNECT_DELAY_MIN;
        // Ends when every client handle is dropped.
        for event in connection.iter() {
            match event {
                Ok(Event::Incoming(Incoming::ConnAck(_))) => {
                    log::info!("MQTT broker connected");
                    delay = RECONNECT_DELAY_MIN;
                }
                Ok(Event::Outgoing(Outgoing::Disconnect)) if stopping.load(Ordering::SeqCst) => {
                    break;
                }
                Ok(_) => {}
                Err(e) => {
                    if stopping.load(Ordering::SeqCst) {
                        break;
                    }
                    log::warn!(
                        "MQTT connection error: {}. Reconnecting in {}s",
                        e,
                        delay.as_secs()
                    );
                    if !sleep_unless_stopping(delay, &stopping) {
                        break;
                    }
                    delay = (delay * 2).min(RECONNECT_DELAY_MAX);
                }
            }
        }
    })
}

/// Sleep for `delay`, waking early when a disconnect was requested. Returns false if so.
fn sleep_unless_stopping(delay: Duration, stopping: &AtomicBool) -> bool {
    let deadline = Instant::now() + delay;
    while Instant::now() < deadline {
        if stopping.load(Ordering::SeqCst) {
            return false;
        }
        std::thread::sleep(STOP_POLL_INTERVAL);
    }
    !stopping.load(Ordering::SeqCst)
}

fn alert_topic(prefix: &str) -> String {
    let prefix = prefix.trim_end_matches('/');
    format!("{}/{}", prefix, ALERT_TOPIC_SUFFIX)
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// Parse `host:port`, `[v6]:port`, or `mqtt://host:port`.
pub fn parse_broker_addr(addr: &str) -> Result<(String, u16)> {
    let mut remainder = addr.trim();
    if let Some((scheme, rest)) = remainder.split_once("://") {
        match scheme {
            "mqtt" | "tcp" => {}
            other => return Err(anyhow!("unsupported MQTT scheme: {}", other)),
        }
        remainder = rest;
    }

    if let Some(rest) = remainder.strip_prefix('[') {
        let (host, rest) = rest
            .split_once(']')
            .ok_or_else(|| anyhow!("invalid MQTT address: {}", addr))?;
        let port = rest
            .strip_prefix(':')
            .ok_or_else(|| anyhow!("missing MQTT port in {}", addr))?;
        let port: u16 = port
            .parse()
            .with_context(|| format!("invalid MQTT port in {}", addr))?;
        return Ok((host.to_string(), port));
    }

    let (host, port) = remainder
        .rsplit_once(':')
        .ok_or_else(|| anyhow!("missing MQTT port in {}", addr))?;
    if host.is_empty() {
        return Err(anyhow!("missing MQTT host in {}", addr));
    }
    let port: u16 = port
        .parse()
        .with_context(|| format!("invalid MQTT port in {}", addr))?;
    Ok((host.to_string(), port))
}

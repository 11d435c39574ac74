//! Outbound alert collaborators.
//!
//! Notifiers and voice announcers are injected into a monitoring session. Both are
//! fire-and-forget from the core's point of view: the session reports failures but never
//! retries, and the notification gate only advances when a notifier returns `Ok`.

mod console;
mod mqtt;
mod voice;

use anyhow::Result;
use serde::Serialize;

use crate::hazard::HazardSet;
use crate::risk::RiskLevel;

pub use console::ConsoleNotifier;
pub use mqtt::{parse_broker_addr, MqttNotifier, MqttSettings};
pub use voice::{CommandVoice, ConsoleVoice};

/// What an alert carries to the outside world.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Alert {
    pub hazards: HazardSet,
    pub level: RiskLevel,
    pub score: u32,
}

impl Alert {
    /// Short notification text, e.g. `High risk detected! Hazards: gas_cylinder, ppe`.
    pub fn notification_text(&self) -> String {
        format!(
            "{} risk detected! Hazards: {}",
            self.level,
            self.hazards.joined()
        )
    }

    /// Spoken announcement text.
    pub fn announcement_text(&self) -> String {
        format!(
            "Attention! {} risk detected with hazards: {}",
            self.level,
            self.hazards.joined()
        )
    }
}

/// Delivers an alert (message, push, chat). No delivery guarantee is required.
pub trait Notifier: Send {
    fn name(&self) -> &'static str;

    fn deliver(&mut self, alert: &Alert) -> Result<()>;
}

/// Speaks a formatted message.
pub trait VoiceAnnouncer: Send {
    fn speak(&mut self, message: &str) -> Result<()>;
}

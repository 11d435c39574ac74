use anyhow::Result;

use super::{Alert, Notifier};

/// Writes alerts to the log. Used when no broker is configured.
#[derive(Default)]
pub struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn name(&self) -> &'static str {
        "console"
    }

    fn deliver(&mut self, alert: &Alert) -> Result<()> {
        if !alert.hazards.is_empty() {
            log::warn!("[ALERT] {}", alert.notification_text());
        }
        Ok(())
    }
}

//! Notification gate: suppresses repeated alerts for an unchanged hazard situation.
//!
//! The gate is an explicit value owned by a monitoring session. A fresh (or reset) state
//! always lets the first non-empty hazard set through.

use std::sync::{Arc, Mutex};

use anyhow::{anyhow, Result};

use crate::hazard::HazardSet;

/// Logical gate state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GatePhase<'a> {
    Idle,
    Alerted(&'a HazardSet),
}

/// Outcome of a compare-deliver-record sequence.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GateDecision {
    /// Empty set or same set as the last alert.
    Suppressed,
    /// Delivery ran and the state now holds the current set.
    Fired,
}

/// Most recently alerted hazard set for one session.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NotificationState {
    last_alerted: HazardSet,
}

impl NotificationState {
    pub fn new() -> Self {
        Self::default()
    }

    /// True when `current` is non-empty and differs from the last alerted set.
    pub fn should_alert(&self, current: &HazardSet) -> bool {
        !current.is_empty() && *current != self.last_alerted
    }

    pub fn record(&mut self, current: HazardSet) {
        self.last_alerted = current;
    }

    pub fn reset(&mut self) {
        self.last_alerted = HazardSet::new();
    }

    pub fn last_alerted(&self) -> &HazardSet {
        &self.last_alerted
    }

    pub fn phase(&self) -> GatePhase<'_> {
        if self.last_alerted.is_empty() {
            GatePhase::Idle
        } else {
            GatePhase::Alerted(&self.last_alerted)
        }
    }

    /// Compare, deliver, then record.
    ///
    /// The state only advances when `deliver` returns `Ok`, so a failed delivery is
    /// retried on the next cycle carrying the same hazards.
    pub fn fire_if_changed<F>(&mut self, current: &HazardSet, deliver: F) -> Result<GateDecision>
    where
        F: FnOnce() -> Result<()>,
    {
        if !self.should_alert(current) {
            return Ok(GateDecision::Suppressed);
        }
        deliver()?;
        self.record(current.clone());
        Ok(GateDecision::Fired)
    }
}

/// Gate state shared between cycles that may run on different threads.
///
/// The lock is held across the whole compare-deliver-record sequence.
#[derive(Clone, Debug, Default)]
pub struct SharedNotificationState {
    inner: Arc<Mutex<NotificationState>>,
}

impl SharedNotificationState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fire_if_changed<F>(&self, current: &HazardSet, deliver: F) -> Result<GateDecision>
    where
        F: FnOnce() -> Result<()>,
    {
        let mut guard = self
            .inner
            .lock()
            .map_err(|_| anyhow!("notification state lock poisoned"))?;
        guard.fire_if_changed(current, deliver)
    }

    pub fn reset(&self) -> Result<()> {
        let mut guard = self
            .inner
            .lock()
            .map_err(|_| anyhow!("notification state lock poisoned"))?;
        guard.reset();
        Ok(())
    }

    pub fn snapshot(&self) -> Result<NotificationState> {
        let guard = self
            .inner
            .lock()
            .map_err(|_| anyhow!("notification state lock poisoned"))?;
        Ok(guard.clone())
    }
}

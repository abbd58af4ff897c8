use std::time::{Duration, Instant};

/// Enforces a minimum cooldown between physical alerts.
pub struct AlertGate {
    cooldown: Duration,
    last_alert_time: Option<Instant>,
}

impl AlertGate {
    pub fn new(cooldown: Duration) -> Self {
        Self {
            cooldown,
            last_alert_time: None,
        }
    }

    /// Returns true and records `now` when an alert may fire.
    pub fn try_alert(&mut self, now: Instant) -> bool {
        let open = match self.last_alert_time {
            None => true,
            Some(last) => now.saturating_duration_since(last) >= self.cooldown,
        };
        if open {
            self.last_alert_time = Some(now);
        }
        open
    }

    pub fn last_alert_time(&self) -> Option<Instant> {
        self.last_alert_time
    }

    /// Time left before the gate reopens, zero when open.
    pub fn remaining(&self, now: Instant) -> Duration {
        match self.last_alert_time {
            None => Duration::ZERO,
            Some(last) => self
                .cooldown
                .saturating_sub(now.saturating_duration_since(last)),
        }
    }
}

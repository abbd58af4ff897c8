use crate::decision::gate::AlertGate;
use crate::decision::predicate::should_alert;
use crate::history::HistoryWindow;
use crate::prelude::{AnalysisResult, MonitorConfig};
use serde::Serialize;
use std::time::{Duration, Instant};

/// Outcome of feeding one sample through window, predicate and gate.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    /// Behavior not sustained across the window.
    Idle,
    /// Concerning, but still inside the cooldown.
    Suppressed,
    /// Concerning and the gate is open; the caller must actuate.
    Fire,
}

/// Owns the per-run history and cooldown state.
pub struct DecisionEngine {
    window: HistoryWindow,
    gate: AlertGate,
}

impl DecisionEngine {
    pub fn new(capacity: usize, cooldown: Duration) -> Self {
        Self {
            window: HistoryWindow::with_capacity(capacity),
            gate: AlertGate::new(cooldown),
        }
    }

    pub fn from_config(config: &MonitorConfig) -> Self {
        Self::new(config.history_capacity(), config.alert_cooldown())
    }

    pub fn push(&mut self, result: AnalysisResult) {
        self.window.push(result);
    }

    /// Consults the gate only when the predicate holds.
    pub fn evaluate(&mut self, now: Instant) -> Decision {
        if !should_alert(&self.window) {
            return Decision::Idle;
        }

        if self.gate.try_alert(now) {
            Decision::Fire
        } else {
            Decision::Suppressed
        }
    }

    pub fn window(&self) -> &HistoryWindow {
        &self.window
    }

    pub fn gate(&self) -> &AlertGate {
        &self.gate
    }
}

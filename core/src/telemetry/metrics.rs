use crate::monitor::runner::{AlertOutcome, CycleReport};
use crate::monitor::state::MonitorState;
use crate::prelude::AnalysisResult;
use serde::Serialize;
use std::sync::Mutex;

/// Shared, thread-safe view of the monitor's progress.
pub struct MetricsRecorder {
    inner: Mutex<MonitorSnapshot>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct MonitorSnapshot {
    pub state: MonitorState,
    pub cycles: u64,
    pub capture_failures: u64,
    pub analysis_failures: u64,
    pub alerts_fired: u64,
    pub alerts_suppressed: u64,
    pub actuation_failures: u64,
    pub history_len: usize,
    pub history_capacity: usize,
    pub last_analysis: Option<AnalysisResult>,
    pub last_alert: Option<&'static str>,
    pub last_error: Option<String>,
}

impl MetricsRecorder {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(MonitorSnapshot::default()),
        }
    }

    pub fn set_state(&self, state: MonitorState) {
        if let Ok(mut metrics) = self.inner.lock() {
            metrics.state = state;
        }
    }

    pub fn set_capacity(&self, capacity: usize) {
        if let Ok(mut metrics) = self.inner.lock() {
            metrics.history_capacity = capacity;
        }
    }

    pub fn record_cycle(&self, report: &CycleReport, history_len: usize, capacity: usize) {
        let Ok(mut metrics) = self.inner.lock() else {
            return;
        };
        metrics.cycles = report.cycle();
        metrics.history_len = history_len;
        metrics.history_capacity = capacity;

        match report {
            CycleReport::CaptureFailed { error, .. } => {
                metrics.capture_failures += 1;
                metrics.last_error = Some(error.to_string());
            }
            CycleReport::AnalysisFailed { error, .. } => {
                metrics.analysis_failures += 1;
                metrics.last_error = Some(error.to_string());
            }
            CycleReport::Evaluated {
                analysis, alert, ..
            } => {
                metrics.last_analysis = Some(*analysis);
                metrics.last_alert = Some(alert.label());
                match alert {
                    AlertOutcome::Idle => {}
                    AlertOutcome::Suppressed => metrics.alerts_suppressed += 1,
                    AlertOutcome::Fired => metrics.alerts_fired += 1,
                    AlertOutcome::ActuationFailed(err) => {
                        metrics.actuation_failures += 1;
                        metrics.last_error = Some(err.to_string());
                    }
                }
            }
        }
    }

    pub fn snapshot(&self) -> MonitorSnapshot {
        if let Ok(metrics) = self.inner.lock() {
            metrics.clone()
        } else {
            MonitorSnapshot::default()
        }
    }
}

impl Default for MetricsRecorder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prelude::{AnalysisError, Posture};

    #[test]
    fn recorder_counts_failures_and_alerts() {
        let recorder = MetricsRecorder::new();
        recorder.record_cycle(
            &CycleReport::AnalysisFailed {
                cycle: 1,
                error: AnalysisError::MissingResponse,
            },
            0,
            5,
        );
        recorder.record_cycle(
            &CycleReport::Evaluated {
                cycle: 2,
                analysis: AnalysisResult::new(true, Posture::Sitting, 0.6).unwrap(),
                alert: AlertOutcome::Suppressed,
            },
            1,
            5,
        );

        let snapshot = recorder.snapshot();
        assert_eq!(snapshot.cycles, 2);
        assert_eq!(snapshot.analysis_failures, 1);
        assert_eq!(snapshot.alerts_suppressed, 1);
        assert_eq!(snapshot.history_len, 1);
        assert_eq!(snapshot.last_alert, Some("suppressed"));
    }

    #[test]
    fn snapshot_serializes_for_status_consumers() {
        let recorder = MetricsRecorder::new();
        recorder.set_state(MonitorState::Sleeping);
        let json = serde_json::to_value(recorder.snapshot()).unwrap();
        assert_eq!(json["state"], "sleeping");
        assert!(json["last_analysis"].is_null());
    }
}

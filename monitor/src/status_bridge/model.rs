use samcamcore::telemetry::MonitorSnapshot;
use serde::Serialize;

/// Body of `GET /status`.
#[derive(Debug, Clone, Serialize)]
pub struct StatusReport {
    pub service: &'static str,
    pub uptime_secs: u64,
    /// False once the loop has stopped or failed.
    pub running: bool,
    pub history_full: bool,
    pub monitor: MonitorSnapshot,
}

impl StatusReport {
    pub fn new(monitor: MonitorSnapshot, uptime_secs: u64) -> Self {
        Self {
            service: "samcam",
            uptime_secs,
            running: !monitor.state.is_terminal(),
            history_full: monitor.history_capacity > 0
                && monitor.history_len == monitor.history_capacity,
            monitor,
        }
    }
}

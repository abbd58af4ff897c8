use serde::Serialize;

/// Lifecycle of the monitor loop.
#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum MonitorState {
    #[default]
    Opening,
    Capturing,
    Analyzing,
    UpdatingHistory,
    Evaluating,
    Alerting,
    Sleeping,
    Stopped,
    Failed,
}

impl MonitorState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, MonitorState::Stopped | MonitorState::Failed)
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_stopped_and_failed_are_terminal() {
        assert!(MonitorState::Stopped.is_terminal());
        assert!(MonitorState::Failed.is_terminal());
        assert!(!MonitorState::Opening.is_terminal());
        assert!(!MonitorState::Sleeping.is_terminal());
    }
}

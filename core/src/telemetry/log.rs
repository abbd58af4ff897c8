use crate::monitor::runner::{AlertOutcome, CycleReport};
use log::{error, info, warn};

/// Emits one structured line per monitor cycle.
pub struct LogManager;

impl LogManager {
    pub fn new() -> Self {
        Self
    }

    pub fn record(&self, message: &str) {
        info!("{}", message);
    }

    pub fn cycle(&self, report: &CycleReport) {
        let line = format_cycle(report);
        match report {
            CycleReport::CaptureFailed { .. } | CycleReport::AnalysisFailed { .. } => {
                warn!("{}", line)
            }
            CycleReport::Evaluated {
                alert: AlertOutcome::ActuationFailed(_),
                ..
            } => error!("{}", line),
            CycleReport::Evaluated { .. } => self.record(&line),
        }
    }
}

impl Default for LogManager {
    fn default() -> Self {
        Self::new()
    }
}

fn format_cycle(report: &CycleReport) -> String {
    match report {
        CycleReport::CaptureFailed { cycle, error } => {
            format!("cycle={} capture=error error=\"{}\"", cycle, error)
        }
        CycleReport::AnalysisFailed { cycle, error } => {
            format!("cycle={} capture=ok analysis=error error=\"{}\"", cycle, error)
        }
        CycleReport::Evaluated {
            cycle,
            analysis,
            alert,
        } => {
            let mut line = format!(
                "cycle={} capture=ok dog={} posture={} panting={:.2} concerning={} alert={}",
                cycle,
                analysis.is_dog_present(),
                analysis.posture().as_str(),
                analysis.panting_probability(),
                !matches!(alert, AlertOutcome::Idle),
                alert.label()
            );
            if let AlertOutcome::ActuationFailed(err) = alert {
                line.push_str(&format!(" error=\"{}\"", err));
            }
            line
        }
    }
}

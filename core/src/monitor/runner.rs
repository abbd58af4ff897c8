use crate::decision::{Decision, DecisionEngine};
use crate::monitor::shutdown::ShutdownSignal;
use crate::monitor::state::MonitorState;
use crate::prelude::{
    ActuationError, AlertAction, AnalysisError, AnalysisResult, CaptureError, ConfigurationError,
    FrameSource, MonitorConfig, MonitorError, VisionAnalyzer,
};
use crate::telemetry::log::LogManager;
use crate::telemetry::metrics::MetricsRecorder;
use log::{debug, error, info};
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Instant;

/// What the alert step did in a cycle that produced an analysis.
#[derive(Debug)]
pub enum AlertOutcome {
    Idle,
    Suppressed,
    Fired,
    /// Counted against the cooldown even though the device failed.
    ActuationFailed(ActuationError),
}

impl AlertOutcome {
    pub fn label(&self) -> &'static str {
        match self {
            AlertOutcome::Idle => "idle",
            AlertOutcome::Suppressed => "suppressed",
            AlertOutcome::Fired => "fired",
            AlertOutcome::ActuationFailed(_) => "actuation_failed",
        }
    }
}

/// Result of a single capture/analyze/evaluate cycle.
#[derive(Debug)]
pub enum CycleReport {
    CaptureFailed {
        cycle: u64,
        error: CaptureError,
    },
    AnalysisFailed {
        cycle: u64,
        error: AnalysisError,
    },
    Evaluated {
        cycle: u64,
        analysis: AnalysisResult,
        alert: AlertOutcome,
    },
}

impl CycleReport {
    pub fn cycle(&self) -> u64 {
        match self {
            CycleReport::CaptureFailed { cycle, .. }
            | CycleReport::AnalysisFailed { cycle, .. }
            | CycleReport::Evaluated { cycle, .. } => *cycle,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub cycles: u64,
    pub alerts_fired: u64,
    pub final_state: MonitorState,
}

/// Everything a cycle touches except the frame source.
struct Pipeline<V, A> {
    analyzer: V,
    alert: A,
    engine: DecisionEngine,
    state: MonitorState,
    cycles: u64,
    alerts_fired: u64,
    logger: LogManager,
    metrics: Arc<MetricsRecorder>,
}

impl<V: VisionAnalyzer, A: AlertAction> Pipeline<V, A> {
    fn transition(&mut self, next: MonitorState) {
        if self.state != next {
            debug!("monitor state {:?} -> {:?}", self.state, next);
            self.state = next;
            self.metrics.set_state(next);
        }
    }

    fn run_cycle<S: FrameSource>(&mut self, source: &mut S, now: Instant) -> CycleReport {
        self.cycles += 1;
        let cycle = self.cycles;

        self.transition(MonitorState::Capturing);
        let frame = match source.capture() {
            Ok(frame) => frame,
            Err(error) => return self.finish(CycleReport::CaptureFailed { cycle, error }),
        };

        self.transition(MonitorState::Analyzing);
        let analysis = match self.analyzer.analyze(&frame) {
            Ok(analysis) => analysis,
            Err(error) => return self.finish(CycleReport::AnalysisFailed { cycle, error }),
        };

        self.transition(MonitorState::UpdatingHistory);
        self.engine.push(analysis);

        self.transition(MonitorState::Evaluating);
        let alert = match self.engine.evaluate(now) {
            Decision::Idle => AlertOutcome::Idle,
            Decision::Suppressed => {
                debug!(
                    "alert suppressed, {}s of cooldown left",
                    self.engine.gate().remaining(now).as_secs()
                );
                AlertOutcome::Suppressed
            }
            Decision::Fire => {
                self.transition(MonitorState::Alerting);
                self.alerts_fired += 1;
                match self.alert.activate() {
                    Ok(()) => AlertOutcome::Fired,
                    Err(err) => AlertOutcome::ActuationFailed(err),
                }
            }
        };

        self.finish(CycleReport::Evaluated {
            cycle,
            analysis,
            alert,
        })
    }

    fn finish(&mut self, report: CycleReport) -> CycleReport {
        self.logger.cycle(&report);
        let window = self.engine.window();
        self.metrics
            .record_cycle(&report, window.len(), window.capacity());
        report
    }

    fn summary(&self) -> RunSummary {
        RunSummary {
            cycles: self.cycles,
            alerts_fired: self.alerts_fired,
            final_state: self.state,
        }
    }
}

/// Releases the frame source when dropped, on every exit path.
struct CaptureSession<'a, S: FrameSource> {
    source: &'a mut S,
}

impl<S: FrameSource> Drop for CaptureSession<'_, S> {
    fn drop(&mut self) {
        self.source.release();
        info!("frame source released");
    }
}

/// Sequential capture -> analyze -> evaluate -> alert loop.
pub struct MonitorLoop<S, V, A> {
    config: MonitorConfig,
    source: S,
    pipeline: Pipeline<V, A>,
}

impl<S, V, A> MonitorLoop<S, V, A>
where
    S: FrameSource,
    V: VisionAnalyzer,
    A: AlertAction,
{
    pub fn new(
        config: MonitorConfig,
        source: S,
        analyzer: V,
        alert: A,
    ) -> Result<Self, ConfigurationError> {
        config.validate()?;
        let engine = DecisionEngine::from_config(&config);
        let metrics = Arc::new(MetricsRecorder::new());
        metrics.set_capacity(engine.window().capacity());

        Ok(Self {
            config,
            source,
            pipeline: Pipeline {
                analyzer,
                alert,
                engine,
                state: MonitorState::Opening,
                cycles: 0,
                alerts_fired: 0,
                logger: LogManager::new(),
                metrics,
            },
        })
    }

    /// Shares the recorder this loop publishes to.
    pub fn metrics(&self) -> Arc<MetricsRecorder> {
        self.pipeline.metrics.clone()
    }

    pub fn state(&self) -> MonitorState {
        self.pipeline.state
    }

    pub fn engine(&self) -> &DecisionEngine {
        &self.pipeline.engine
    }

    /// Runs one cycle against an already opened source.
    pub fn run_cycle(&mut self, now: Instant) -> CycleReport {
        self.pipeline.run_cycle(&mut self.source, now)
    }

    /// Opens the source and cycles until `shutdown` fires or a cycle panics.
    pub fn run(&mut self, shutdown: &mut ShutdownSignal) -> Result<RunSummary, MonitorError> {
        let interval = self.config.check_interval();
        let pipeline = &mut self.pipeline;

        pipeline.transition(MonitorState::Opening);
        if let Err(err) = self.source.open() {
            pipeline.transition(MonitorState::Failed);
            error!("unable to open frame source: {}", err);
            return Err(MonitorError::Startup(err));
        }

        info!(
            "monitor started: interval {}s, window {} samples, cooldown {}s",
            self.config.check_interval_seconds,
            pipeline.engine.window().capacity(),
            self.config.alert_cooldown_seconds
        );

        let session = CaptureSession {
            source: &mut self.source,
        };

        let outcome = loop {
            if shutdown.is_triggered() {
                break Ok(());
            }

            let started = Instant::now();
            let cycle = pipeline.cycles + 1;
            let source = &mut *session.source;
            let result = panic::catch_unwind(AssertUnwindSafe(|| {
                pipeline.run_cycle(source, started);
            }));

            if let Err(payload) = result {
                let message = panic_message(payload.as_ref());
                pipeline.transition(MonitorState::Failed);
                error!("cycle={} aborted, stopping monitor: {}", cycle, message);
                break Err(MonitorError::CyclePanicked { cycle, message });
            }

            pipeline.transition(MonitorState::Sleeping);
            let remaining = interval.saturating_sub(started.elapsed());
            if shutdown.wait(remaining) {
                break Ok(());
            }
        };

        drop(session);

        outcome?;
        pipeline.transition(MonitorState::Stopped);
        let summary = pipeline.summary();
        info!(
            "monitor stopped after {} cycles, {} alerts",
            summary.cycles, summary.alerts_fired
        );
        Ok(summary)
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}

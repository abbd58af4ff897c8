use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Posture reported by the vision model for the subject in frame.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Posture {
    None,
    Sitting,
    Standing,
    LyingDown,
}

impl Posture {
    pub fn as_str(&self) -> &'static str {
        match self {
            Posture::None => "none",
            Posture::Sitting => "sitting",
            Posture::Standing => "standing",
            Posture::LyingDown => "lying_down",
        }
    }
}

/// One analysis sample, produced once per successful cycle.
///
/// `posture` is only meaningful when a dog is present.
#[derive(Debug, Clone, Copy, Serialize, PartialEq)]
pub struct AnalysisResult {
    is_dog_present: bool,
    posture: Posture,
    panting_probability: f32,
}

impl AnalysisResult {
    pub fn new(
        is_dog_present: bool,
        posture: Posture,
        panting_probability: f32,
    ) -> Result<Self, AnalysisError> {
        if !(0.0..=1.0).contains(&panting_probability) {
            return Err(AnalysisError::ProbabilityOutOfRange(panting_probability));
        }
        Ok(Self {
            is_dog_present,
            posture,
            panting_probability,
        })
    }

    /// Sample for a frame with no dog in it.
    pub fn absent() -> Self {
        Self {
            is_dog_present: false,
            posture: Posture::None,
            panting_probability: 0.0,
        }
    }

    pub fn is_dog_present(&self) -> bool {
        self.is_dog_present
    }

    pub fn posture(&self) -> Posture {
        self.posture
    }

    pub fn panting_probability(&self) -> f32 {
        self.panting_probability
    }
}

/// Encoded image handed from the frame source to the analyzer.
#[derive(Debug, Clone)]
pub struct Frame {
    pub name: String,
    pub bytes: Vec<u8>,
}

impl Frame {
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            bytes,
        }
    }
}

/// Largest history window accepted from configuration.
pub const MAX_HISTORY_CAPACITY: usize = 10_000;

/// Timing configuration consumed by the monitor loop. Fixed at startup.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct MonitorConfig {
    pub check_interval_seconds: u64,
    pub alert_threshold_minutes: u64,
    pub alert_cooldown_seconds: u64,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            check_interval_seconds: 60,
            alert_threshold_minutes: 5,
            alert_cooldown_seconds: 300,
        }
    }
}

impl MonitorConfig {
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if self.check_interval_seconds == 0 {
            return Err(ConfigurationError::Invalid {
                field: "check_interval_seconds",
                reason: "must be greater than zero".into(),
            });
        }
        if self.alert_threshold_minutes == 0 {
            return Err(ConfigurationError::Invalid {
                field: "alert_threshold_minutes",
                reason: "must be greater than zero".into(),
            });
        }
        match self.sample_count() {
            Some(samples) if samples <= MAX_HISTORY_CAPACITY => Ok(()),
            _ => Err(ConfigurationError::Invalid {
                field: "alert_threshold_minutes",
                reason: format!(
                    "needs more than {} samples at a {}s interval",
                    MAX_HISTORY_CAPACITY, self.check_interval_seconds
                ),
            }),
        }
    }

    pub fn check_interval(&self) -> Duration {
        Duration::from_secs(self.check_interval_seconds)
    }

    pub fn alert_cooldown(&self) -> Duration {
        Duration::from_secs(self.alert_cooldown_seconds)
    }

    /// Number of samples needed to cover the alert threshold, rounded up.
    /// Clamped to `1..=MAX_HISTORY_CAPACITY`; `validate` rejects configs
    /// that would need more.
    pub fn history_capacity(&self) -> usize {
        self.sample_count()
            .unwrap_or(MAX_HISTORY_CAPACITY)
            .clamp(1, MAX_HISTORY_CAPACITY)
    }

    fn sample_count(&self) -> Option<usize> {
        let threshold_secs = self.alert_threshold_minutes.checked_mul(60)?;
        let interval = self.check_interval_seconds.max(1);
        usize::try_from(threshold_secs.div_ceil(interval)).ok()
    }
}

#[derive(thiserror::Error, Debug)]
pub enum CaptureError {
    #[error("capture device unavailable: {0}")]
    DeviceUnavailable(String),
    #[error("failed to read frame: {0}")]
    FrameRead(String),
    #[error("no frames available in {0}")]
    NoFrames(String),
}

#[derive(thiserror::Error, Debug)]
pub enum AnalysisError {
    #[error("analysis request failed: {0}")]
    Request(String),
    #[error("no response text received from the model")]
    MissingResponse,
    #[error("malformed model response: {0}")]
    Malformed(String),
    #[error("panting probability {0} outside [0.0, 1.0]")]
    ProbabilityOutOfRange(f32),
}

#[derive(thiserror::Error, Debug)]
pub enum ActuationError {
    #[error("alert device unreachable: {0}")]
    Unreachable(String),
    #[error("alert device rejected command: {0}")]
    Rejected(String),
}

#[derive(thiserror::Error, Debug)]
pub enum ConfigurationError {
    #[error("missing required setting {0}")]
    Missing(&'static str),
    #[error("invalid setting {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Errors that end a monitor run.
#[derive(thiserror::Error, Debug)]
pub enum MonitorError {
    #[error("failed to open frame source: {0}")]
    Startup(#[source] CaptureError),
    #[error("cycle {cycle} aborted unexpectedly: {message}")]
    CyclePanicked { cycle: u64, message: String },
}

/// Camera-like source of frames. Opened once, released once.
pub trait FrameSource {
    fn open(&mut self) -> Result<(), CaptureError>;
    fn capture(&mut self) -> Result<Frame, CaptureError>;
    fn release(&mut self);
}

/// Vision model that classifies a frame.
pub trait VisionAnalyzer {
    fn analyze(&mut self, frame: &Frame) -> Result<AnalysisResult, AnalysisError>;
}

/// Physical alert (the light). Best effort.
pub trait AlertAction {
    fn activate(&mut self) -> Result<(), ActuationError>;
}

impl<T: FrameSource + ?Sized> FrameSource for Box<T> {
    fn open(&mut self) -> Result<(), CaptureError> {
        (**self).open()
    }

    fn capture(&mut self) -> Result<Frame, CaptureError> {
        (**self).capture()
    }

    fn release(&mut self) {
        (**self).release()
    }
}

impl<T: VisionAnalyzer + ?Sized> VisionAnalyzer for Box<T> {
    fn analyze(&mut self, frame: &Frame) -> Result<AnalysisResult, AnalysisError> {
        (**self).analyze(frame)
    }
}

impl<T: AlertAction + ?Sized> AlertAction for Box<T> {
    fn activate(&mut self) -> Result<(), ActuationError> {
        (**self).activate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn analysis_result_rejects_out_of_range_probability() {
        assert!(AnalysisResult::new(true, Posture::Standing, 1.2).is_err());
        assert!(AnalysisResult::new(true, Posture::Standing, -0.1).is_err());
        assert!(AnalysisResult::new(true, Posture::Standing, f32::NAN).is_err());
        assert!(AnalysisResult::new(true, Posture::Standing, 1.0).is_ok());
        assert!(AnalysisResult::new(false, Posture::None, 0.0).is_ok());
    }

    #[test]
    fn default_config_covers_five_minutes_in_five_samples() {
        let config = MonitorConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.history_capacity(), 5);
    }

    #[test]
    fn history_capacity_rounds_up() {
        let config = MonitorConfig {
            check_interval_seconds: 70,
            alert_threshold_minutes: 5,
            alert_cooldown_seconds: 300,
        };
        assert_eq!(config.history_capacity(), 5);

        let coarse = MonitorConfig {
            check_interval_seconds: 600,
            alert_threshold_minutes: 5,
            alert_cooldown_seconds: 300,
        };
        assert_eq!(coarse.history_capacity(), 1);
    }

    #[test]
    fn zero_interval_is_rejected() {
        let config = MonitorConfig {
            check_interval_seconds: 0,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigurationError::Invalid {
                field: "check_interval_seconds",
                ..
            })
        ));
    }

    #[test]
    fn oversized_threshold_is_rejected() {
        let config = MonitorConfig {
            check_interval_seconds: 1,
            alert_threshold_minutes: u64::MAX,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigurationError::Invalid {
                field: "alert_threshold_minutes",
                ..
            })
        ));
        assert_eq!(config.history_capacity(), MAX_HISTORY_CAPACITY);

        let day_at_one_second = MonitorConfig {
            check_interval_seconds: 1,
            alert_threshold_minutes: 24 * 60,
            ..Default::default()
        };
        assert!(day_at_one_second.validate().is_err());

        let largest = MonitorConfig {
            check_interval_seconds: 6,
            alert_threshold_minutes: 1_000,
            ..Default::default()
        };
        assert!(largest.validate().is_ok());
        assert_eq!(largest.history_capacity(), MAX_HISTORY_CAPACITY);
    }

    #[test]
    fn posture_serializes_snake_case() {
        let json = serde_json::to_string(&Posture::LyingDown).unwrap();
        assert_eq!(json, "\"lying_down\"");
    }
}

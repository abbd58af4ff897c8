//! Decision engine and monitor loop for the SamCam crate watcher.
//!
//! The crate keeps a short history of vision-model samples, decides whether
//! the dog has behaved in a concerning way for the whole threshold window,
//! and gates the physical alert behind a cooldown. Camera, model and light
//! are reached only through the collaborator traits in [`prelude`].

pub mod decision;
pub mod history;
pub mod monitor;
pub mod prelude;
pub mod telemetry;

pub use monitor::MonitorLoop;
pub use prelude::{AnalysisResult, MonitorConfig, Posture};

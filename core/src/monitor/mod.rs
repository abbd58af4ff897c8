pub mod runner;
pub mod shutdown;
pub mod state;

pub use runner::{AlertOutcome, CycleReport, MonitorLoop, RunSummary};
pub use shutdown::{ShutdownHandle, ShutdownSignal};
pub use state::MonitorState;

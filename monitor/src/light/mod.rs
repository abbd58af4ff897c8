pub mod wiz;

pub use wiz::WizLight;

use log::info;
use samcamcore::prelude::{ActuationError, AlertAction};

/// Stands in for the light when actuation is disabled.
pub struct NoopLight;

impl AlertAction for NoopLight {
    fn activate(&mut self) -> Result<(), ActuationError> {
        info!("light skipped (SKIP_LIGHT set)");
        Ok(())
    }
}

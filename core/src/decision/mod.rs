pub mod engine;
pub mod gate;
pub mod predicate;

pub use engine::{Decision, DecisionEngine};
pub use gate::AlertGate;
pub use predicate::{is_concerning, should_alert};

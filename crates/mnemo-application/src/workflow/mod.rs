//! The confirmation workflow: analysis, decisions and apply.

mod guard;
mod orchestrator;
mod outcome;

pub use guard::{InFlight, InFlightGuard};
pub use orchestrator::WorkflowOrchestrator;
pub use outcome::{Revision, WorkflowOutcome};

//! Application layer for mnemo.
//!
//! Coordinates the domain traits from `mnemo-core` into the capture
//! workflow: session state, the confirmation state machine, the storage
//! applier and the two entry adapters.

pub mod adapters;
pub mod applier;
pub mod session;
pub mod workflow;

pub use adapters::{InsightAdapter, InsightRejection, InteractiveAdapter, InteractiveEvent};
pub use applier::StorageApplier;
pub use session::InMemorySessionStore;
pub use workflow::{WorkflowOrchestrator, WorkflowOutcome};

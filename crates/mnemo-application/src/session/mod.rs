//! Session state owned by the workflow orchestrator.

mod id;
mod store;

pub use id::InsightIdGenerator;
pub use store::InMemorySessionStore;

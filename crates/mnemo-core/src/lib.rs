//! Domain layer for mnemo.
//!
//! Holds the data shapes exchanged between the workflow orchestrator and its
//! collaborators (proposal model, session model, decisions, insight events),
//! the collaborator traits themselves, and the shared error type.

pub mod analysis;
pub mod config;
pub mod decision;
pub mod error;
pub mod insight;
pub mod proposal;
pub mod reply;
pub mod session;
pub mod speech;
pub mod tree;

// Re-export common error type
pub use error::{MnemoError, Result};

//! Session domain module.
//!
//! A session tracks the single live proposal for one originating identity
//! (a chat participant) or one inbound insight event, plus the routing mode
//! that decides how that identity's next message is interpreted.
//!
//! # Module Structure
//!
//! - `model`: `Session`, `SessionId`, `SessionOrigin`, `WorkflowMode`, `SessionPhase`
//! - `store`: `SessionStore` trait, the only way the orchestrator touches session state

mod model;
mod store;

pub use model::{Identity, Session, SessionId, SessionOrigin, SessionPhase, WorkflowMode};
pub use store::SessionStore;

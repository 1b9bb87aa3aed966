//! Session store trait.
//!
//! Defines the only operations the workflow orchestrator may use on session
//! state, so an in-memory map can be swapped for any other backing store.

use super::model::{Session, SessionId, SessionOrigin, WorkflowMode};
use crate::error::Result;
use crate::proposal::Proposal;
use async_trait::async_trait;

/// Volatile mapping from session key to pending proposal state.
///
/// # Implementation Notes
///
/// Each method must be atomic on its own. Serializing a `get` with the `put`
/// that depends on it is the orchestrator's job, not the store's.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Creates (or reuses) a session for the given origin.
    ///
    /// - `Interactive`: the key is derived from the identity; an existing
    ///   session for it is returned untouched.
    /// - `Insight`: a fresh, collision-resistant key is generated every call.
    async fn create(&self, origin: SessionOrigin) -> Result<SessionId>;

    /// Stores `proposal` as the session's only live proposal, replacing any
    /// previous one, records the text it was derived from and gives the
    /// session a `version` no earlier proposal of this store has carried.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the session no longer exists (e.g. it was
    /// cancelled while its analysis was running).
    async fn put(&self, session_id: &SessionId, proposal: Proposal, original_text: String)
    -> Result<()>;

    /// Finds a session by its key.
    async fn get(&self, session_id: &SessionId) -> Result<Option<Session>>;

    /// Sets the routing mode of an existing session.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the session does not exist.
    async fn set_mode(&self, session_id: &SessionId, mode: WorkflowMode) -> Result<()>;

    /// Removes a session. Removing an absent session is a no-op.
    async fn remove(&self, session_id: &SessionId) -> Result<()>;

    /// Number of live sessions.
    async fn len(&self) -> Result<usize>;
}

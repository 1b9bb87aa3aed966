use super::id::InsightIdGenerator;
use async_trait::async_trait;
use mnemo_core::proposal::Proposal;
use mnemo_core::session::{Session, SessionId, SessionOrigin, SessionStore, WorkflowMode};
use mnemo_core::{MnemoError, Result};
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use tokio::sync::RwLock;

/// In-memory [`SessionStore`].
///
/// Sessions live for the lifetime of the process; nothing is persisted.
/// Proposal versions count up across the whole store, so a recreated
/// session never reuses a version an older message still carries.
pub struct InMemorySessionStore {
    sessions: Arc<RwLock<HashMap<SessionId, Session>>>,
    ids: InsightIdGenerator,
    versions: AtomicU32,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            ids: InsightIdGenerator::new(),
            versions: AtomicU32::new(0),
        }
    }
}

impl Default for InMemorySessionStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn create(&self, origin: SessionOrigin) -> Result<SessionId> {
        let id = match origin {
            SessionOrigin::Interactive { identity } => SessionId::for_identity(identity),
            SessionOrigin::Insight => self.ids.next_id(),
        };

        let mut sessions = self.sessions.write().await;
        sessions
            .entry(id.clone())
            .or_insert_with(|| Session::new(id.clone(), origin));
        Ok(id)
    }

    async fn put(
        &self,
        session_id: &SessionId,
        proposal: Proposal,
        original_text: String,
    ) -> Result<()> {
        let mut sessions = self.sessions.write().await;
        let session = sessions
            .get_mut(session_id)
            .ok_or_else(|| MnemoError::not_found("Session", session_id.as_str()))?;
        session.proposal = Some(proposal);
        session.original_text = original_text;
        session.version = self.versions.fetch_add(1, Ordering::Relaxed).wrapping_add(1);
        Ok(())
    }

    async fn get(&self, session_id: &SessionId) -> Result<Option<Session>> {
        let sessions = self.sessions.read().await;
        Ok(sessions.get(session_id).cloned())
    }

    async fn set_mode(&self, session_id: &SessionId, mode: WorkflowMode) -> Result<()> {
        let mut sessions = self.sessions.write().await;
        let session = sessions
            .get_mut(session_id)
            .ok_or_else(|| MnemoError::not_found("Session", session_id.as_str()))?;
        session.mode = mode;
        Ok(())
    }

    async fn remove(&self, session_id: &SessionId) -> Result<()> {
        let mut sessions = self.sessions.write().await;
        sessions.remove(session_id);
        Ok(())
    }

    async fn len(&self) -> Result<usize> {
        Ok(self.sessions.read().await.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mnemo_core::proposal::{Action, ActionMode};
    use mnemo_core::session::Identity;

    fn proposal(summary: &str) -> Proposal {
        Proposal {
            actions: vec![Action {
                path: "notes/a.md".to_string(),
                mode: ActionMode::Create,
                content: summary.to_string(),
                description: "note".to_string(),
            }],
            summary: summary.to_string(),
        }
    }

    #[tokio::test]
    async fn test_interactive_create_reuses_session() {
        let store = InMemorySessionStore::new();
        let origin = SessionOrigin::Interactive {
            identity: Identity(7),
        };

        let first = store.create(origin).await.unwrap();
        store
            .put(&first, proposal("one"), "text".to_string())
            .await
            .unwrap();
        let second = store.create(origin).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(store.len().await.unwrap(), 1);
        // Re-creating must not wipe the live proposal.
        assert!(store.get(&first).await.unwrap().unwrap().proposal.is_some());
    }

    #[tokio::test]
    async fn test_insight_create_is_fresh_every_time() {
        let store = InMemorySessionStore::new();
        let a = store.create(SessionOrigin::Insight).await.unwrap();
        let b = store.create(SessionOrigin::Insight).await.unwrap();
        let chat = store
            .create(SessionOrigin::Interactive {
                identity: Identity(7),
            })
            .await
            .unwrap();

        assert_ne!(a, b);
        assert_ne!(a, chat);
        assert_eq!(store.len().await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_put_overwrites_previous_proposal() {
        let store = InMemorySessionStore::new();
        let id = store.create(SessionOrigin::Insight).await.unwrap();

        store.put(&id, proposal("first"), "t1".to_string()).await.unwrap();
        store.put(&id, proposal("second"), "t2".to_string()).await.unwrap();

        let session = store.get(&id).await.unwrap().unwrap();
        assert_eq!(session.proposal.unwrap().summary, "second");
        assert_eq!(session.original_text, "t2");
        assert_eq!(session.version, 2);
    }

    #[tokio::test]
    async fn test_recreated_session_never_reuses_a_version() {
        let store = InMemorySessionStore::new();
        let origin = SessionOrigin::Interactive {
            identity: Identity(7),
        };

        let id = store.create(origin).await.unwrap();
        store.put(&id, proposal("one"), "t1".to_string()).await.unwrap();
        store.remove(&id).await.unwrap();

        let id = store.create(origin).await.unwrap();
        assert_eq!(store.get(&id).await.unwrap().unwrap().version, 0);
        store.put(&id, proposal("two"), "t2".to_string()).await.unwrap();
        assert_eq!(store.get(&id).await.unwrap().unwrap().version, 2);
    }

    #[tokio::test]
    async fn test_put_and_set_mode_on_missing_session() {
        let store = InMemorySessionStore::new();
        let missing = SessionId::new("evt-missing");

        let err = store
            .put(&missing, proposal("x"), String::new())
            .await
            .unwrap_err();
        assert!(err.is_not_found());

        let err = store
            .set_mode(&missing, WorkflowMode::Idle)
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_remove_is_idempotent() {
        let store = InMemorySessionStore::new();
        let id = store.create(SessionOrigin::Insight).await.unwrap();

        store.remove(&id).await.unwrap();
        store.remove(&id).await.unwrap();
        store.remove(&SessionId::new("never-created")).await.unwrap();

        assert!(store.get(&id).await.unwrap().is_none());
        assert_eq!(store.len().await.unwrap(), 0);
    }
}

//! StorageApplier - writes confirmed proposals to the backing tree.
//!
//! Every confirmed proposal from every session goes through one applier, and
//! `commit` holds a single global lock across pull, writes and push so two
//! proposals never interleave writes or end up in the same commit.

use chrono::NaiveDate;
use mnemo_core::Result;
use mnemo_core::proposal::Action;
use mnemo_core::tree::{TreeStore, VersionControl};
use std::sync::Arc;
use tokio::sync::Mutex;

/// The write that stopped an apply sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApplyFailure {
    pub path: String,
    pub reason: String,
}

/// Result of writing a proposal's actions locally.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ApplyOutcome {
    /// Paths written successfully, in order, without duplicates.
    pub applied: Vec<String>,
    /// Set when a write failed; later actions were not attempted.
    pub failed: Option<ApplyFailure>,
}

impl ApplyOutcome {
    pub fn is_complete(&self) -> bool {
        self.failed.is_none()
    }
}

/// Full result of [`StorageApplier::commit`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitReport {
    pub outcome: ApplyOutcome,
    /// Why the post-write sync failed, if it did.
    pub sync_error: Option<String>,
}

pub struct StorageApplier {
    tree: Arc<dyn TreeStore>,
    vcs: Arc<dyn VersionControl>,
    write_lock: Mutex<()>,
}

impl StorageApplier {
    pub fn new(tree: Arc<dyn TreeStore>, vcs: Arc<dyn VersionControl>) -> Self {
        Self {
            tree,
            vcs,
            write_lock: Mutex::new(()),
        }
    }

    /// Fast-forwards the local tree from its remote.
    pub async fn sync_before(&self) -> Result<()> {
        self.vcs.pull().await
    }

    /// Applies `actions` in order, stopping at the first failed write.
    ///
    /// Writes that already happened stay in the tree; there is no rollback.
    pub async fn apply(&self, actions: &[Action]) -> ApplyOutcome {
        let mut outcome = ApplyOutcome::default();

        for action in actions {
            match self
                .tree
                .write(&action.path, action.mode, &action.content)
                .await
            {
                Ok(()) => {
                    tracing::debug!("[Applier] {} {}", action.mode, action.path);
                    if !outcome.applied.contains(&action.path) {
                        outcome.applied.push(action.path.clone());
                    }
                }
                Err(e) => {
                    tracing::error!("[Applier] Write to {} failed: {}", action.path, e);
                    outcome.failed = Some(ApplyFailure {
                        path: action.path.clone(),
                        reason: e.to_string(),
                    });
                    break;
                }
            }
        }

        outcome
    }

    /// Stages, commits and pushes everything in the tree.
    pub async fn sync_after(&self, message: &str) -> Result<()> {
        self.vcs.commit_and_push(message).await
    }

    /// Pull, write and push as one serialized unit.
    ///
    /// A failed pull is logged and the writes go ahead against the local
    /// tree. The push runs even after a partial apply so the remote mirrors
    /// what is actually on disk.
    pub async fn commit(&self, actions: &[Action], message: &str) -> CommitReport {
        let _guard = self.write_lock.lock().await;

        if let Err(e) = self.sync_before().await {
            tracing::warn!("[Applier] Pull failed, applying to local tree: {}", e);
        }

        let outcome = self.apply(actions).await;

        let sync_error = if outcome.applied.is_empty() {
            None
        } else {
            match self.sync_after(message).await {
                Ok(()) => None,
                Err(e) => {
                    tracing::warn!("[Applier] Sync after apply failed: {}", e);
                    Some(e.to_string())
                }
            }
        };

        CommitReport {
            outcome,
            sync_error,
        }
    }
}

/// Commit message for an applied proposal: `"{date}: {first summary line}"`.
pub fn commit_message(date: NaiveDate, summary: &str) -> String {
    let line = summary
        .lines()
        .map(str::trim)
        .find(|l| !l.is_empty())
        .unwrap_or("update");
    format!("{}: {}", date.format("%Y-%m-%d"), line)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use mnemo_core::MnemoError;
    use mnemo_core::proposal::ActionMode;
    use std::sync::Mutex as StdMutex;

    #[derive(Default)]
    struct RecordingVcs {
        calls: StdMutex<Vec<String>>,
        fail_pull: bool,
        fail_push: bool,
    }

    #[async_trait]
    impl VersionControl for RecordingVcs {
        async fn pull(&self) -> Result<()> {
            self.calls.lock().unwrap().push("pull".to_string());
            if self.fail_pull {
                return Err(MnemoError::sync("no remote"));
            }
            Ok(())
        }

        async fn commit_and_push(&self, message: &str) -> Result<()> {
            self.calls.lock().unwrap().push(format!("push {message}"));
            if self.fail_push {
                return Err(MnemoError::sync("rejected"));
            }
            Ok(())
        }
    }

    /// Tree that fails writes to one path.
    #[derive(Default)]
    struct FlakyTree {
        writes: StdMutex<Vec<String>>,
        fail_on: Option<String>,
    }

    #[async_trait]
    impl TreeStore for FlakyTree {
        async fn write(&self, path: &str, _mode: ActionMode, _content: &str) -> Result<()> {
            if self.fail_on.as_deref() == Some(path) {
                return Err(MnemoError::apply(path, "disk full"));
            }
            self.writes.lock().unwrap().push(path.to_string());
            Ok(())
        }

        async fn read(&self, _path: &str) -> Result<Option<String>> {
            Ok(None)
        }
    }

    fn action(path: &str) -> Action {
        Action {
            path: path.to_string(),
            mode: ActionMode::Append,
            content: "x".to_string(),
            description: path.to_string(),
        }
    }

    #[tokio::test]
    async fn test_partial_apply_stops_and_still_syncs() {
        let tree = Arc::new(FlakyTree {
            fail_on: Some("b.md".to_string()),
            ..Default::default()
        });
        let vcs = Arc::new(RecordingVcs::default());
        let applier = StorageApplier::new(tree.clone(), vcs.clone());

        let report = applier
            .commit(&[action("a.md"), action("b.md"), action("c.md")], "msg")
            .await;

        assert_eq!(report.outcome.applied, vec!["a.md"]);
        assert_eq!(report.outcome.failed.as_ref().unwrap().path, "b.md");
        assert_eq!(*tree.writes.lock().unwrap(), vec!["a.md"]);
        assert_eq!(*vcs.calls.lock().unwrap(), vec!["pull", "push msg"]);
        assert!(report.sync_error.is_none());
    }

    #[tokio::test]
    async fn test_pull_failure_is_not_fatal() {
        let tree = Arc::new(FlakyTree::default());
        let vcs = Arc::new(RecordingVcs {
            fail_pull: true,
            ..Default::default()
        });
        let applier = StorageApplier::new(tree.clone(), vcs);

        let report = applier.commit(&[action("a.md")], "msg").await;
        assert!(report.outcome.is_complete());
        assert!(report.sync_error.is_none());
        assert_eq!(tree.writes.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_push_failure_is_reported() {
        let vcs = Arc::new(RecordingVcs {
            fail_push: true,
            ..Default::default()
        });
        let applier = StorageApplier::new(Arc::new(FlakyTree::default()), vcs);

        let report = applier.commit(&[action("a.md")], "msg").await;
        assert!(report.outcome.is_complete());
        assert!(report.sync_error.unwrap().contains("rejected"));
    }

    #[tokio::test]
    async fn test_nothing_written_skips_push() {
        let tree = Arc::new(FlakyTree {
            fail_on: Some("a.md".to_string()),
            ..Default::default()
        });
        let vcs = Arc::new(RecordingVcs::default());
        let applier = StorageApplier::new(tree, vcs.clone());

        let report = applier.commit(&[action("a.md")], "msg").await;
        assert!(report.outcome.applied.is_empty());
        assert_eq!(*vcs.calls.lock().unwrap(), vec!["pull"]);
    }

    #[tokio::test]
    async fn test_repeated_path_listed_once() {
        let applier = StorageApplier::new(
            Arc::new(FlakyTree::default()),
            Arc::new(RecordingVcs::default()),
        );
        let outcome = applier.apply(&[action("a.md"), action("a.md")]).await;
        assert_eq!(outcome.applied, vec!["a.md"]);
    }

    #[test]
    fn test_commit_message_uses_first_summary_line() {
        let date = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        assert_eq!(
            commit_message(date, "Logging a daily note\nwith details"),
            "2024-05-01: Logging a daily note"
        );
        assert_eq!(commit_message(date, "   "), "2024-05-01: update");
    }
}

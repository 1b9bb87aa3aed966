//! Backing tree and version-control collaborator interfaces.

use crate::error::Result;
use crate::proposal::ActionMode;
use async_trait::async_trait;

/// The directory tree that applied actions are written into.
#[async_trait]
pub trait TreeStore: Send + Sync {
    /// Writes `content` to `path` (relative to the tree root), creating any
    /// missing parent directories.
    ///
    /// # Errors
    ///
    /// Returns `Apply` if the path escapes the root or the write fails.
    async fn write(&self, path: &str, mode: ActionMode, content: &str) -> Result<()>;

    /// Reads a file back; `Ok(None)` if it does not exist.
    async fn read(&self, path: &str) -> Result<Option<String>>;
}

/// Synchronization of the backing tree with its remote copy.
#[async_trait]
pub trait VersionControl: Send + Sync {
    /// Fast-forwards the local tree from the remote.
    async fn pull(&self) -> Result<()>;

    /// Stages everything, commits with `message` and pushes.
    async fn commit_and_push(&self, message: &str) -> Result<()>;
}

//! Git synchronization of the backing tree.
//!
//! Shells out to the `git` binary in the tree root, the same way the desktop
//! app inspects workspaces, but through `tokio::process` with a time bound so
//! a hung remote cannot stall the workflow.

use async_trait::async_trait;
use mnemo_core::tree::VersionControl;
use mnemo_core::{MnemoError, Result};
use std::path::PathBuf;
use std::time::Duration;
use tokio::process::Command;

/// [`VersionControl`] implemented with the git CLI.
#[derive(Debug, Clone)]
pub struct GitVersionControl {
    repo: PathBuf,
    timeout: Duration,
    /// Optional committer identity passed as `-c user.name/-c user.email`.
    identity: Option<(String, String)>,
}

impl GitVersionControl {
    pub fn new(repo: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self {
            repo: repo.into(),
            timeout,
            identity: None,
        }
    }

    /// Commits as the given identity instead of relying on git config.
    pub fn with_identity(mut self, name: impl Into<String>, email: impl Into<String>) -> Self {
        self.identity = Some((name.into(), email.into()));
        self
    }

    async fn run(&self, args: &[&str]) -> Result<std::process::Output> {
        let mut command = Command::new("git");
        command.current_dir(&self.repo).kill_on_drop(true);
        if let Some((name, email)) = &self.identity {
            command
                .arg("-c")
                .arg(format!("user.name={name}"))
                .arg("-c")
                .arg(format!("user.email={email}"));
        }
        command.args(args);

        let operation = format!("git {}", args.first().copied().unwrap_or_default());
        match tokio::time::timeout(self.timeout, command.output()).await {
            Ok(Ok(output)) => Ok(output),
            Ok(Err(e)) => Err(MnemoError::sync(format!("failed to spawn {operation}: {e}"))),
            Err(_) => Err(MnemoError::timeout(operation, self.timeout.as_secs())),
        }
    }

    async fn run_checked(&self, args: &[&str]) -> Result<()> {
        let output = self.run(args).await?;
        if output.status.success() {
            return Ok(());
        }

        let stderr = String::from_utf8_lossy(&output.stderr);
        let stdout = String::from_utf8_lossy(&output.stdout);
        let detail = if stderr.trim().is_empty() {
            stdout.trim().to_string()
        } else {
            stderr.trim().to_string()
        };
        Err(MnemoError::sync(format!(
            "git {} exited with {}: {}",
            args.join(" "),
            output.status,
            detail
        )))
    }

    /// True when the index holds changes relative to HEAD.
    async fn has_staged_changes(&self) -> Result<bool> {
        let output = self.run(&["diff", "--cached", "--quiet"]).await?;
        match output.status.code() {
            Some(0) => Ok(false),
            Some(1) => Ok(true),
            _ => Err(MnemoError::sync(format!(
                "git diff --cached failed: {}",
                String::from_utf8_lossy(&output.stderr).trim()
            ))),
        }
    }
}

#[async_trait]
impl VersionControl for GitVersionControl {
    async fn pull(&self) -> Result<()> {
        self.run_checked(&["pull", "--ff-only"]).await?;
        tracing::debug!("[Git] Pulled {}", self.repo.display());
        Ok(())
    }

    async fn commit_and_push(&self, message: &str) -> Result<()> {
        self.run_checked(&["add", "-A"]).await?;

        if self.has_staged_changes().await? {
            self.run_checked(&["commit", "-m", message]).await?;
        } else {
            tracing::info!("[Git] Nothing to commit in {}", self.repo.display());
        }

        self.run_checked(&["push"]).await?;
        tracing::debug!("[Git] Pushed {}", self.repo.display());
        Ok(())
    }
}

/// [`VersionControl`] that does nothing, for trees without a remote.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopVersionControl;

#[async_trait]
impl VersionControl for NoopVersionControl {
    async fn pull(&self) -> Result<()> {
        Ok(())
    }

    async fn commit_and_push(&self, _message: &str) -> Result<()> {
        Ok(())
    }
}

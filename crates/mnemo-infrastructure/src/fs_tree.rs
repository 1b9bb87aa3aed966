//! Backing tree stored as plain files under a root directory.

use async_trait::async_trait;
use mnemo_core::proposal::{ActionMode, is_contained};
use mnemo_core::tree::TreeStore;
use mnemo_core::{MnemoError, Result};
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;

/// Delimiter placed before and after every appended block.
pub const APPEND_DELIMITER: &str = "\n";

/// Formats one appended block.
pub fn append_block(content: &str) -> String {
    format!("{APPEND_DELIMITER}{content}{APPEND_DELIMITER}")
}

/// [`TreeStore`] backed by the local filesystem.
///
/// Responsibilities:
/// - Resolve relative action paths against the root, refusing anything that
///   would land outside it (including through symlinked directories)
/// - Create missing parent directories
/// - Append or replace file content
#[derive(Debug, Clone)]
pub struct FsTreeStore {
    root: PathBuf,
}

impl FsTreeStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolves `path` to an absolute target, creating its parent directory.
    ///
    /// The deepest existing ancestor is resolved and checked against the root
    /// before anything is created.
    async fn prepare_target(&self, path: &str) -> Result<PathBuf> {
        if !is_contained(path) {
            return Err(MnemoError::apply(path, "path escapes the tree root"));
        }

        let target = self.root.join(path.trim());
        let parent = target
            .parent()
            .ok_or_else(|| MnemoError::apply(path, "path has no parent directory"))?;

        fs::create_dir_all(&self.root)
            .await
            .map_err(|e| MnemoError::apply(path, format!("tree root unavailable: {e}")))?;
        let canonical_root = fs::canonicalize(&self.root)
            .await
            .map_err(|e| MnemoError::apply(path, format!("tree root unavailable: {e}")))?;

        let existing = deepest_existing_ancestor(parent)
            .await
            .ok_or_else(|| MnemoError::apply(path, "no existing ancestor directory"))?;
        ensure_inside(path, &existing, &canonical_root).await?;

        fs::create_dir_all(parent)
            .await
            .map_err(|e| MnemoError::apply(path, format!("failed to create directory: {e}")))?;
        ensure_inside(path, parent, &canonical_root).await?;

        Ok(target)
    }
}

async fn deepest_existing_ancestor(dir: &Path) -> Option<PathBuf> {
    for ancestor in dir.ancestors() {
        if fs::try_exists(ancestor).await.unwrap_or(false) {
            return Some(ancestor.to_path_buf());
        }
    }
    None
}

async fn ensure_inside(path: &str, dir: &Path, canonical_root: &Path) -> Result<()> {
    let resolved = fs::canonicalize(dir)
        .await
        .map_err(|e| MnemoError::apply(path, format!("failed to resolve directory: {e}")))?;
    if !resolved.starts_with(canonical_root) {
        return Err(MnemoError::apply(path, "path resolves outside the tree root"));
    }
    Ok(())
}

#[async_trait]
impl TreeStore for FsTreeStore {
    async fn write(&self, path: &str, mode: ActionMode, content: &str) -> Result<()> {
        let target = self.prepare_target(path).await?;

        match mode {
            ActionMode::Append => {
                let mut file = fs::OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(&target)
                    .await
                    .map_err(|e| MnemoError::apply(path, format!("failed to open: {e}")))?;
                file.write_all(append_block(content).as_bytes())
                    .await
                    .map_err(|e| MnemoError::apply(path, format!("failed to append: {e}")))?;
                file.flush()
                    .await
                    .map_err(|e| MnemoError::apply(path, format!("failed to flush: {e}")))?;
            }
            ActionMode::Create => {
                fs::write(&target, content)
                    .await
                    .map_err(|e| MnemoError::apply(path, format!("failed to write: {e}")))?;
            }
        }

        tracing::debug!("[Tree] {} {} ({} bytes)", mode, path, content.len());
        Ok(())
    }

    async fn read(&self, path: &str) -> Result<Option<String>> {
        if !is_contained(path) {
            return Err(MnemoError::apply(path, "path escapes the tree root"));
        }

        match fs::read_to_string(self.root.join(path.trim())).await {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_create_then_read_yields_content() {
        let temp_dir = TempDir::new().unwrap();
        let store = FsTreeStore::new(temp_dir.path());

        store
            .write("notes/rust.md", ActionMode::Create, "# Rust\nownership")
            .await
            .unwrap();

        let content = store.read("notes/rust.md").await.unwrap();
        assert_eq!(content.as_deref(), Some("# Rust\nownership"));
    }

    #[tokio::test]
    async fn test_create_replaces_existing_content() {
        let temp_dir = TempDir::new().unwrap();
        let store = FsTreeStore::new(temp_dir.path());

        store.write("ideas/a.md", ActionMode::Create, "first").await.unwrap();
        store.write("ideas/a.md", ActionMode::Create, "").await.unwrap();

        assert_eq!(store.read("ideas/a.md").await.unwrap().as_deref(), Some(""));
    }

    #[tokio::test]
    async fn test_sequential_appends_concatenate_in_order() {
        let temp_dir = TempDir::new().unwrap();
        let store = FsTreeStore::new(temp_dir.path());

        store
            .write("daily/2024/05/01.md", ActionMode::Append, "- 09:00 coffee")
            .await
            .unwrap();
        store
            .write("daily/2024/05/01.md", ActionMode::Append, "- 10:00 standup")
            .await
            .unwrap();

        let content = store.read("daily/2024/05/01.md").await.unwrap().unwrap();
        assert_eq!(
            content,
            format!("{}{}", append_block("- 09:00 coffee"), append_block("- 10:00 standup"))
        );
        assert_eq!(content, "\n- 09:00 coffee\n\n- 10:00 standup\n");
    }

    #[tokio::test]
    async fn test_append_to_existing_file() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::write(temp_dir.path().join("log.md"), "# Log").unwrap();
        let store = FsTreeStore::new(temp_dir.path());

        store.write("log.md", ActionMode::Append, "entry").await.unwrap();

        assert_eq!(
            store.read("log.md").await.unwrap().as_deref(),
            Some("# Log\nentry\n")
        );
    }

    #[tokio::test]
    async fn test_traversal_is_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path().join("tree");
        std::fs::create_dir_all(&root).unwrap();
        let store = FsTreeStore::new(&root);

        let err = store
            .write("../escape.md", ActionMode::Create, "x")
            .await
            .unwrap_err();
        assert!(matches!(err, MnemoError::Apply { .. }));
        assert!(!temp_dir.path().join("escape.md").exists());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_symlinked_directory_outside_root_is_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path().join("tree");
        let outside = temp_dir.path().join("outside");
        std::fs::create_dir_all(&root).unwrap();
        std::fs::create_dir_all(&outside).unwrap();
        std::os::unix::fs::symlink(&outside, root.join("link")).unwrap();

        let store = FsTreeStore::new(&root);
        let err = store
            .write("link/secret.md", ActionMode::Create, "x")
            .await
            .unwrap_err();

        assert!(matches!(err, MnemoError::Apply { .. }));
        assert!(!outside.join("secret.md").exists());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_symlinked_directory_gets_no_new_subdirectories() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path().join("tree");
        let outside = temp_dir.path().join("outside");
        std::fs::create_dir_all(&root).unwrap();
        std::fs::create_dir_all(&outside).unwrap();
        std::os::unix::fs::symlink(&outside, root.join("link")).unwrap();

        let store = FsTreeStore::new(&root);
        let err = store
            .write("link/newdir/deeper/x.md", ActionMode::Create, "x")
            .await
            .unwrap_err();

        assert!(matches!(err, MnemoError::Apply { .. }));
        assert!(!outside.join("newdir").exists());
    }

    #[tokio::test]
    async fn test_read_missing_file() {
        let temp_dir = TempDir::new().unwrap();
        let store = FsTreeStore::new(temp_dir.path());
        assert_eq!(store.read("nope.md").await.unwrap(), None);
    }
}

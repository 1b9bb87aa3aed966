//! Infrastructure adapters for mnemo: the on-disk backing tree, git
//! synchronization, and configuration loading.

pub mod config_storage;
pub mod fs_tree;
pub mod git;
pub mod paths;

pub use config_storage::ConfigStorage;
pub use fs_tree::FsTreeStore;
pub use git::{GitVersionControl, NoopVersionControl};
pub use paths::MnemoPaths;

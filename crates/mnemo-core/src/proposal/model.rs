//! Validated proposal types.

use serde::{Deserialize, Serialize};
use std::path::{Component, Path};
use strum::{Display, EnumString};

/// How an action mutates its target file.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum ActionMode {
    /// Add a newline-delimited block to the end of the file, creating it if absent.
    Append,
    /// Replace the file's entire content.
    Create,
}

/// One file mutation inside the backing tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Action {
    /// Path relative to the backing tree root.
    pub path: String,
    pub mode: ActionMode,
    /// Text to write. May be empty for a `create` of an empty file.
    pub content: String,
    /// Short label shown to the user when confirming.
    pub description: String,
}

impl Action {
    /// Returns true if `path` is non-empty, relative, and never climbs above
    /// the tree root.
    pub fn has_contained_path(&self) -> bool {
        is_contained(&self.path)
    }
}

/// Checks that a relative path stays inside whatever root it is joined to.
pub fn is_contained(path: &str) -> bool {
    let trimmed = path.trim();
    if trimmed.is_empty() {
        return false;
    }

    let mut depth: usize = 0;
    for component in Path::new(trimmed).components() {
        match component {
            Component::Normal(_) => depth += 1,
            Component::CurDir => {}
            Component::ParentDir => {
                if depth == 0 {
                    return false;
                }
                depth -= 1;
            }
            Component::RootDir | Component::Prefix(_) => return false,
        }
    }

    depth > 0
}

/// Output of a successful analysis.
///
/// A proposal always carries at least one action; an empty result is an
/// analysis failure and never reaches this type (see [`RawProposal`]).
///
/// [`RawProposal`]: super::RawProposal
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Proposal {
    pub actions: Vec<Action>,
    pub summary: String,
}

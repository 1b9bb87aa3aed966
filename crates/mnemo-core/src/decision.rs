//! User decisions on a pending proposal.

use serde::{Deserialize, Serialize};

/// What the user decided to do with a session's pending proposal.
///
/// Always scoped to a specific session by the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum Decision {
    /// Apply the proposal to the backing tree.
    Confirm,
    /// Re-analyze the original text with these instructions as extra context.
    Edit(String),
    /// Discard the proposal and the session.
    Cancel,
}

impl Decision {
    pub fn label(&self) -> &'static str {
        match self {
            Decision::Confirm => "confirm",
            Decision::Edit(_) => "edit",
            Decision::Cancel => "cancel",
        }
    }
}

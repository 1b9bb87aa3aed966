//! Session domain model.

use crate::proposal::Proposal;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A chat participant as identified by the interactive transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Identity(pub i64);

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Opaque session key.
///
/// Interactive sessions use a stable key derived from the identity so that
/// repeated interactions reuse one session; insight sessions get a freshly
/// generated key per event.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    const INTERACTIVE_PREFIX: &'static str = "chat-";

    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The stable session key for an interactive identity.
    pub fn for_identity(identity: Identity) -> Self {
        Self(format!("{}{}", Self::INTERACTIVE_PREFIX, identity.0))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_interactive(&self) -> bool {
        self.0.starts_with(Self::INTERACTIVE_PREFIX)
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SessionId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// Which entry path created a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum SessionOrigin {
    /// Typed or spoken input from a chat participant.
    Interactive { identity: Identity },
    /// An externally pushed insight event.
    Insight,
}

/// How the owner's next free-text message is routed.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum WorkflowMode {
    /// Next message is a brand-new input.
    #[default]
    Idle,
    /// Next message is edit instructions for `target`, which may be this
    /// session or an insight session delivered to the same identity.
    AwaitingEditInstructions { target: SessionId },
}

/// Observable lifecycle position of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionPhase {
    Idle,
    Analyzing,
    AwaitingConfirmation,
    Applying,
}

/// Volatile per-identity (or per-event) workflow record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub id: SessionId,
    pub origin: SessionOrigin,
    /// The text that produced the current proposal; reused for edit re-analysis.
    pub original_text: String,
    pub proposal: Option<Proposal>,
    /// Store-unique stamp of the current proposal; 0 before the first one.
    #[serde(default)]
    pub version: u32,
    pub mode: WorkflowMode,
    pub created_at: DateTime<Utc>,
}

impl Session {
    pub fn new(id: SessionId, origin: SessionOrigin) -> Self {
        Self {
            id,
            origin,
            original_text: String::new(),
            proposal: None,
            version: 0,
            mode: WorkflowMode::Idle,
            created_at: Utc::now(),
        }
    }

    /// Phase implied by the stored record alone (ignores in-flight work).
    pub fn resting_phase(&self) -> SessionPhase {
        if self.proposal.is_some() {
            SessionPhase::AwaitingConfirmation
        } else {
            SessionPhase::Idle
        }
    }

    /// The session this record's owner is currently editing, if any.
    pub fn edit_target(&self) -> Option<&SessionId> {
        match &self.mode {
            WorkflowMode::AwaitingEditInstructions { target } => Some(target),
            WorkflowMode::Idle => None,
        }
    }
}

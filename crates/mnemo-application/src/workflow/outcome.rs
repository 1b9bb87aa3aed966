use mnemo_core::proposal::Proposal;
use mnemo_core::session::{SessionId, SessionPhase};

/// How a stored proposal relates to what the session held before.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Revision {
    /// The session had no proposal.
    Fresh,
    /// New input replaced an unconfirmed proposal.
    Superseded,
    /// Edit instructions produced a refreshed proposal.
    Edited,
}

/// Everything the orchestrator can report back to an entry adapter.
#[derive(Debug, Clone, PartialEq)]
pub enum WorkflowOutcome {
    /// A proposal is stored and awaits a decision.
    Proposed {
        session_id: SessionId,
        proposal: Proposal,
        revision: Revision,
        /// Session version the proposal was stored under.
        version: u32,
    },
    /// Analysis failed or returned nothing usable.
    AnalysisFailed {
        session_id: SessionId,
        reason: String,
        /// True when an earlier proposal is still pending.
        kept_previous: bool,
    },
    /// Another operation is running for this session.
    StillBusy {
        session_id: SessionId,
        phase: SessionPhase,
    },
    /// New input refused because a proposal is still unconfirmed.
    PendingProposalExists { session_id: SessionId },
    /// The next free-text message will be treated as edit instructions.
    AwaitingEditInstructions { target: SessionId },
    Applied { files: Vec<String> },
    /// Written to the local tree but not synchronized.
    AppliedLocally { files: Vec<String>, reason: String },
    /// A write failed part way; earlier writes remain.
    ApplyFailed {
        applied: Vec<String>,
        failed_path: String,
        reason: String,
        sync_error: Option<String>,
    },
    Cancelled,
    /// The decision referred to a session with nothing pending.
    NothingPending,
    /// The button belonged to a proposal that was replaced since.
    Stale { session_id: SessionId },
    /// The session was cancelled while its analysis ran; the result was dropped.
    Discarded,
}

impl WorkflowOutcome {
    /// Session that now holds a live proposal, if any.
    pub fn proposed_session(&self) -> Option<&SessionId> {
        match self {
            WorkflowOutcome::Proposed { session_id, .. } => Some(session_id),
            _ => None,
        }
    }
}

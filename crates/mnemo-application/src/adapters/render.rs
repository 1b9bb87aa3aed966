//! Turns workflow outcomes into user-facing replies.

use crate::workflow::{Revision, WorkflowOutcome};
use mnemo_core::proposal::Proposal;
use mnemo_core::reply::{Choice, Reply, ReplyButton};
use mnemo_core::session::{SessionId, SessionPhase};

pub const ANALYZING_NOTICE: &str = "Analyzing…";
pub const TRANSCRIBING_NOTICE: &str = "Transcribing…";

/// Renders a proposal with its confirm / edit / cancel buttons.
///
/// The buttons carry `version`, so pressing them after the proposal was
/// replaced does not act on the replacement.
pub fn render_proposal(
    session_id: &SessionId,
    proposal: &Proposal,
    revision: Revision,
    version: u32,
) -> Reply {
    let mut text = String::new();
    match revision {
        Revision::Fresh => {}
        Revision::Superseded => {
            text.push_str("Your previous unconfirmed proposal was replaced by this one.\n\n")
        }
        Revision::Edited => text.push_str("Updated proposal:\n\n"),
    }

    text.push_str("📝 ");
    text.push_str(proposal.summary.trim());
    text.push_str("\n\n");
    for action in &proposal.actions {
        text.push_str(&format!("• {} ({})\n", action.description, action.path));
    }
    text.push_str("\nSave?");

    let buttons = Choice::ALL
        .iter()
        .map(|choice| ReplyButton::new(*choice, session_id.clone()).at_version(version))
        .collect();
    Reply::text(text).with_buttons(buttons)
}

fn file_list(files: &[String]) -> String {
    files
        .iter()
        .map(|f| format!("• {f}"))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Renders `outcome`, or `None` when there is nothing to tell the user.
pub fn render_outcome(outcome: &WorkflowOutcome) -> Option<Reply> {
    let reply = match outcome {
        WorkflowOutcome::Proposed {
            session_id,
            proposal,
            revision,
            version,
        } => render_proposal(session_id, proposal, *revision, *version),
        WorkflowOutcome::AnalysisFailed {
            reason,
            kept_previous,
            ..
        } => {
            let mut text = format!("❌ Could not analyze that: {reason}");
            if *kept_previous {
                text.push_str("\nThe previous proposal is still waiting for your decision.");
            }
            Reply::text(text)
        }
        WorkflowOutcome::StillBusy { phase, .. } => Reply::text(match phase {
            SessionPhase::Analyzing => "⏳ Still analyzing the previous message, please wait.",
            SessionPhase::Applying => "⏳ Still saving, please wait.",
            _ => "⏳ Still working, please wait.",
        }),
        WorkflowOutcome::PendingProposalExists { .. } => Reply::text(
            "There is an unconfirmed proposal. Please resolve it before sending something new.",
        ),
        WorkflowOutcome::AwaitingEditInstructions { .. } => {
            Reply::text("✏️ What should be changed? Send your corrections as text or voice.")
        }
        WorkflowOutcome::Applied { files } => {
            Reply::resolution(format!("✅ Saved:\n{}", file_list(files)))
        }
        WorkflowOutcome::AppliedLocally { files, reason } => Reply::resolution(format!(
            "⚠️ Saved locally, but not synchronized: {reason}\n{}",
            file_list(files)
        )),
        WorkflowOutcome::ApplyFailed {
            applied,
            failed_path,
            reason,
            sync_error,
        } => {
            let mut text = format!("❌ Saving stopped at {failed_path}: {reason}");
            if !applied.is_empty() {
                text.push_str("\nWritten before the failure:\n");
                text.push_str(&file_list(applied));
            }
            if let Some(sync_error) = sync_error {
                text.push_str(&format!("\nSync also failed: {sync_error}"));
            }
            Reply::resolution(text)
        }
        WorkflowOutcome::Cancelled => Reply::resolution("🗑 Cancelled."),
        WorkflowOutcome::NothingPending => Reply::resolution("Nothing pending."),
        WorkflowOutcome::Stale { .. } => Reply::resolution(
            "⌛ This proposal was replaced by a newer one. Use the buttons on the latest message.",
        ),
        WorkflowOutcome::Discarded => return None,
    };
    Some(reply)
}

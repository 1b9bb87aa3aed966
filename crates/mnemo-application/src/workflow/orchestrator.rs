//! WorkflowOrchestrator - the confirmation state machine.
//!
//! Sessions move `Idle → Analyzing → AwaitingConfirmation`, then either to
//! `Applying` (confirm), back through `Analyzing` (edit), or out (cancel).
//! The orchestrator is the only writer of session state.

use super::guard::{InFlight, InFlightGuard};
use super::outcome::{Revision, WorkflowOutcome};
use crate::applier::{StorageApplier, commit_message};
use mnemo_core::analysis::{AnalysisRequest, Analyzer};
use mnemo_core::config::PendingInputPolicy;
use mnemo_core::decision::Decision;
use mnemo_core::insight::InsightEvent;
use mnemo_core::reply::{Choice, ReplyButton};
use mnemo_core::session::{
    Identity, Session, SessionId, SessionOrigin, SessionPhase, SessionStore, WorkflowMode,
};
use mnemo_core::{MnemoError, Result};
use std::sync::Arc;
use std::time::Duration;

const DEFAULT_ANALYSIS_TIMEOUT: Duration = Duration::from_secs(60);

/// Drives sessions from raw input to an applied or discarded proposal.
///
/// # Concurrency
///
/// Handlers for chat updates, button presses and insight posts run
/// concurrently. Each analysis or apply claims its session in [`InFlight`]
/// first, so the `get` → analyze → `put` sequence of one session can never
/// interleave with another operation on the same session. A second request
/// for a busy session gets [`WorkflowOutcome::StillBusy`]. Cancel skips the
/// claim: cancelling an analyzing session marks the claim cancelled and
/// removes the session, and the late result is discarded.
pub struct WorkflowOrchestrator {
    store: Arc<dyn SessionStore>,
    analyzer: Arc<dyn Analyzer>,
    applier: Arc<StorageApplier>,
    in_flight: InFlight,
    analysis_timeout: Duration,
    pending_input: PendingInputPolicy,
}

impl WorkflowOrchestrator {
    pub fn new(
        store: Arc<dyn SessionStore>,
        analyzer: Arc<dyn Analyzer>,
        applier: Arc<StorageApplier>,
    ) -> Self {
        Self {
            store,
            analyzer,
            applier,
            in_flight: InFlight::new(),
            analysis_timeout: DEFAULT_ANALYSIS_TIMEOUT,
            pending_input: PendingInputPolicy::default(),
        }
    }

    /// Upper bound for a single analysis call.
    pub fn with_analysis_timeout(mut self, timeout: Duration) -> Self {
        self.analysis_timeout = timeout;
        self
    }

    pub fn with_pending_input(mut self, policy: PendingInputPolicy) -> Self {
        self.pending_input = policy;
        self
    }

    /// Routes free text (typed or transcribed) from an interactive identity.
    ///
    /// If the identity's session is awaiting edit instructions, the text is
    /// applied as an edit to the target session; otherwise it is new input.
    pub async fn handle_text(&self, identity: Identity, text: &str) -> Result<WorkflowOutcome> {
        let session_id = SessionId::for_identity(identity);

        if let Some(session) = self.store.get(&session_id).await?
            && let Some(target) = session.edit_target().cloned()
        {
            if let Some(phase) = self.in_flight.phase(&target) {
                return Ok(WorkflowOutcome::StillBusy {
                    session_id: target,
                    phase,
                });
            }

            self.store.set_mode(&session_id, WorkflowMode::Idle).await?;

            let target_pending = self
                .store
                .get(&target)
                .await?
                .is_some_and(|s| s.proposal.is_some());

            // A requester session created only to carry the edit mode.
            if target != session_id
                && session.proposal.is_none()
                && self.in_flight.phase(&session_id).is_none()
            {
                self.store.remove(&session_id).await?;
            }

            if target_pending {
                return self.decide(&target, Decision::Edit(text.to_string())).await;
            }
            tracing::info!(
                "[Workflow] Edit target {} is gone; treating text as new input",
                target
            );
        }

        self.new_input(SessionOrigin::Interactive { identity }, text)
            .await
    }

    /// Starts analysis of brand-new input.
    ///
    /// Interactive origins reuse the identity's session; insight origins get
    /// a fresh session per call.
    pub async fn new_input(&self, origin: SessionOrigin, text: &str) -> Result<WorkflowOutcome> {
        let session_id = match origin {
            SessionOrigin::Interactive { identity } => SessionId::for_identity(identity),
            SessionOrigin::Insight => self.store.create(origin).await?,
        };

        let guard = match self.claim(&session_id, SessionPhase::Analyzing) {
            Ok(guard) => guard,
            Err(busy) => return Ok(busy),
        };

        if matches!(origin, SessionOrigin::Interactive { .. }) {
            self.store.create(origin).await?;
        }
        let had_previous = self
            .store
            .get(&session_id)
            .await?
            .is_some_and(|s| s.proposal.is_some());

        let revision = if had_previous {
            if self.pending_input == PendingInputPolicy::Reject {
                return Ok(WorkflowOutcome::PendingProposalExists { session_id });
            }
            Revision::Superseded
        } else {
            Revision::Fresh
        };

        tracing::info!("[Workflow] Analyzing new input for {}", session_id);
        let request = AnalysisRequest::new(text);
        self.analyze_and_store(guard, session_id, request, had_previous, revision)
            .await
    }

    /// Runs the insight entry path: one fresh session per event.
    pub async fn ingest_insight(&self, event: &InsightEvent) -> Result<WorkflowOutcome> {
        tracing::info!(
            "[Workflow] Insight '{}' for project {}",
            event.kind,
            event.project
        );
        self.new_input(SessionOrigin::Insight, &event.to_capture_text())
            .await
    }

    /// Puts `requester` into edit mode for `target`.
    ///
    /// The requester's next free-text message becomes the edit instructions.
    /// `target` may be the requester's own session or an insight session.
    pub async fn begin_edit(
        &self,
        requester: Identity,
        target: &SessionId,
    ) -> Result<WorkflowOutcome> {
        self.begin_edit_at(requester, target, None).await
    }

    async fn begin_edit_at(
        &self,
        requester: Identity,
        target: &SessionId,
        version: Option<u32>,
    ) -> Result<WorkflowOutcome> {
        if let Some(phase) = self.in_flight.phase(target) {
            return Ok(WorkflowOutcome::StillBusy {
                session_id: target.clone(),
                phase,
            });
        }

        let Some(session) = self.store.get(target).await? else {
            return Ok(WorkflowOutcome::NothingPending);
        };
        if session.proposal.is_none() {
            return Ok(WorkflowOutcome::NothingPending);
        }
        if is_stale(&session, version) {
            return Ok(WorkflowOutcome::Stale {
                session_id: target.clone(),
            });
        }

        let requester_id = self
            .store
            .create(SessionOrigin::Interactive {
                identity: requester,
            })
            .await?;
        self.store
            .set_mode(
                &requester_id,
                WorkflowMode::AwaitingEditInstructions {
                    target: target.clone(),
                },
            )
            .await?;

        tracing::debug!(
            "[Workflow] {} awaiting edit instructions for {}",
            requester_id,
            target
        );
        Ok(WorkflowOutcome::AwaitingEditInstructions {
            target: target.clone(),
        })
    }

    /// Applies a user decision to `session_id`.
    pub async fn decide(&self, session_id: &SessionId, decision: Decision) -> Result<WorkflowOutcome> {
        tracing::debug!("[Workflow] {} on {}", decision.label(), session_id);
        match decision {
            Decision::Confirm => self.confirm(session_id, None).await,
            Decision::Edit(instructions) => self.edit(session_id, instructions).await,
            Decision::Cancel => self.cancel(session_id, None).await,
        }
    }

    /// Handles a pressed proposal button.
    ///
    /// A button rendered for an older version of the session's proposal
    /// answers [`WorkflowOutcome::Stale`] instead of acting on the newer one.
    pub async fn press(&self, requester: Identity, button: &ReplyButton) -> Result<WorkflowOutcome> {
        let session_id = &button.session_id;
        tracing::debug!("[Workflow] {} pressed on {}", button.choice, session_id);
        match button.choice {
            Choice::Confirm => self.confirm(session_id, button.version).await,
            Choice::Edit => {
                self.begin_edit_at(requester, session_id, button.version)
                    .await
            }
            Choice::Cancel => self.cancel(session_id, button.version).await,
        }
    }

    /// Observable phase of a session, or `None` if it does not exist.
    pub async fn phase(&self, session_id: &SessionId) -> Result<Option<SessionPhase>> {
        if let Some(phase) = self.in_flight.phase(session_id) {
            return Ok(Some(phase));
        }
        Ok(self
            .store
            .get(session_id)
            .await?
            .map(|s| s.resting_phase()))
    }

    fn claim(
        &self,
        session_id: &SessionId,
        phase: SessionPhase,
    ) -> std::result::Result<InFlightGuard, WorkflowOutcome> {
        self.in_flight.begin(session_id, phase).map_err(|current| {
            tracing::info!("[Workflow] {} is busy ({:?})", session_id, current);
            WorkflowOutcome::StillBusy {
                session_id: session_id.clone(),
                phase: current,
            }
        })
    }

    async fn confirm(&self, session_id: &SessionId, version: Option<u32>) -> Result<WorkflowOutcome> {
        let _guard = match self.claim(session_id, SessionPhase::Applying) {
            Ok(guard) => guard,
            Err(busy) => return Ok(busy),
        };

        let Some(session) = self.store.get(session_id).await? else {
            return Ok(WorkflowOutcome::NothingPending);
        };
        if session.proposal.is_some() && is_stale(&session, version) {
            return Ok(WorkflowOutcome::Stale {
                session_id: session_id.clone(),
            });
        }
        let Some(proposal) = session.proposal else {
            return Ok(WorkflowOutcome::NothingPending);
        };

        let message = commit_message(chrono::Local::now().date_naive(), &proposal.summary);
        tracing::info!(
            "[Workflow] Applying {} action(s) for {}",
            proposal.actions.len(),
            session_id
        );
        let report = self.applier.commit(&proposal.actions, &message).await;

        // Applied or partially applied, the proposal cannot be safely re-run.
        self.store.remove(session_id).await?;

        let files = report.outcome.applied;
        Ok(match (report.outcome.failed, report.sync_error) {
            (Some(failure), sync_error) => WorkflowOutcome::ApplyFailed {
                applied: files,
                failed_path: failure.path,
                reason: failure.reason,
                sync_error,
            },
            (None, Some(reason)) => WorkflowOutcome::AppliedLocally { files, reason },
            (None, None) => WorkflowOutcome::Applied { files },
        })
    }

    async fn edit(&self, session_id: &SessionId, instructions: String) -> Result<WorkflowOutcome> {
        let guard = match self.claim(session_id, SessionPhase::Analyzing) {
            Ok(guard) => guard,
            Err(busy) => return Ok(busy),
        };

        let Some(session) = self.store.get(session_id).await? else {
            return Ok(WorkflowOutcome::NothingPending);
        };
        if session.proposal.is_none() {
            return Ok(WorkflowOutcome::NothingPending);
        }
        if session.mode != WorkflowMode::Idle {
            self.store.set_mode(session_id, WorkflowMode::Idle).await?;
        }

        tracing::info!("[Workflow] Re-analyzing {} with edit instructions", session_id);
        let request =
            AnalysisRequest::new(session.original_text).with_edit_instructions(instructions);
        self.analyze_and_store(guard, session_id.clone(), request, true, Revision::Edited)
            .await
    }

    async fn cancel(&self, session_id: &SessionId, version: Option<u32>) -> Result<WorkflowOutcome> {
        if self.in_flight.phase(session_id) == Some(SessionPhase::Applying) {
            return Ok(WorkflowOutcome::StillBusy {
                session_id: session_id.clone(),
                phase: SessionPhase::Applying,
            });
        }

        let Some(session) = self.store.get(session_id).await? else {
            return Ok(WorkflowOutcome::NothingPending);
        };
        if is_stale(&session, version) {
            return Ok(WorkflowOutcome::Stale {
                session_id: session_id.clone(),
            });
        }

        if self.in_flight.cancel(session_id) {
            tracing::debug!("[Workflow] Interrupting analysis of {}", session_id);
        }
        self.store.remove(session_id).await?;
        tracing::info!("[Workflow] Cancelled {}", session_id);
        Ok(WorkflowOutcome::Cancelled)
    }

    /// Runs analysis under `guard` and stores the result.
    ///
    /// On failure a session that had no previous proposal is removed; one
    /// that had a proposal keeps it untouched. A result whose claim was
    /// cancelled meanwhile is never stored.
    async fn analyze_and_store(
        &self,
        guard: InFlightGuard,
        session_id: SessionId,
        request: AnalysisRequest,
        had_previous: bool,
        revision: Revision,
    ) -> Result<WorkflowOutcome> {
        let result = match tokio::time::timeout(
            self.analysis_timeout,
            self.analyzer.analyze(&request),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => Err(MnemoError::timeout(
                "analysis",
                self.analysis_timeout.as_secs(),
            )),
        };

        if guard.is_cancelled() {
            tracing::info!(
                "[Workflow] {} was cancelled during analysis; discarding result",
                session_id
            );
            return Ok(WorkflowOutcome::Discarded);
        }

        let proposal = match result {
            Ok(proposal) => proposal,
            Err(e) => {
                tracing::warn!("[Workflow] Analysis failed for {}: {}", session_id, e);
                if !had_previous {
                    self.store.remove(&session_id).await?;
                }
                return Ok(WorkflowOutcome::AnalysisFailed {
                    session_id,
                    reason: e.to_string(),
                    kept_previous: had_previous,
                });
            }
        };

        let stored = match self
            .store
            .put(&session_id, proposal.clone(), request.text)
            .await
        {
            Ok(()) => self.store.get(&session_id).await?,
            Err(e) if e.is_not_found() => None,
            Err(e) => return Err(e),
        };

        match stored {
            Some(session) => {
                tracing::info!(
                    "[Workflow] {} awaiting confirmation ({} action(s), v{})",
                    session_id,
                    proposal.actions.len(),
                    session.version
                );
                Ok(WorkflowOutcome::Proposed {
                    session_id,
                    proposal,
                    revision,
                    version: session.version,
                })
            }
            None => {
                tracing::info!(
                    "[Workflow] {} was cancelled during analysis; discarding result",
                    session_id
                );
                Ok(WorkflowOutcome::Discarded)
            }
        }
    }
}

/// True when `version` names a proposal the session no longer holds.
fn is_stale(session: &Session, version: Option<u32>) -> bool {
    version.is_some_and(|v| v != session.version)
}

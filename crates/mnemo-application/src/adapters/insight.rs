//! InsightAdapter - the external-event front door.
//!
//! Each accepted event becomes its own session whose proposal is delivered
//! to the allowed chat. Decisions come back through that proposal's buttons,
//! which carry the event's session key rather than the chat identity.

use super::render::render_proposal;
use crate::workflow::{WorkflowOrchestrator, WorkflowOutcome};
use mnemo_core::decision::Decision;
use mnemo_core::insight::InsightEvent;
use mnemo_core::reply::ReplyChannel;
use mnemo_core::session::SessionId;
use mnemo_core::MnemoError;
use std::fmt;
use std::sync::Arc;

/// Why an inbound event was not accepted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InsightRejection {
    Unauthorized,
    Malformed(String),
    AnalysisFailed(String),
    /// Analysis succeeded but the proposal could not be stored or delivered.
    Internal(String),
}

impl InsightRejection {
    /// Stable machine-readable reason.
    pub fn reason(&self) -> &'static str {
        match self {
            InsightRejection::Unauthorized => "unauthorized",
            InsightRejection::Malformed(_) => "malformed",
            InsightRejection::AnalysisFailed(_) => "analysis-failed",
            InsightRejection::Internal(_) => "internal",
        }
    }
}

impl From<MnemoError> for InsightRejection {
    fn from(err: MnemoError) -> Self {
        if err.is_authorization() {
            InsightRejection::Unauthorized
        } else if err.is_analysis() {
            InsightRejection::AnalysisFailed(err.to_string())
        } else {
            InsightRejection::Internal(err.to_string())
        }
    }
}

impl fmt::Display for InsightRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InsightRejection::Unauthorized => f.write_str("unauthorized"),
            InsightRejection::Malformed(detail)
            | InsightRejection::AnalysisFailed(detail)
            | InsightRejection::Internal(detail) => write!(f, "{}: {}", self.reason(), detail),
        }
    }
}

pub struct InsightAdapter {
    token: Option<String>,
    orchestrator: Arc<WorkflowOrchestrator>,
    delivery: Arc<dyn ReplyChannel>,
}

impl InsightAdapter {
    /// `token` is the bearer credential events must carry; `None` rejects
    /// every event. `delivery` reaches the allowed chat.
    pub fn new(
        token: Option<String>,
        orchestrator: Arc<WorkflowOrchestrator>,
        delivery: Arc<dyn ReplyChannel>,
    ) -> Self {
        Self {
            token: token.filter(|t| !t.is_empty()),
            orchestrator,
            delivery,
        }
    }

    fn authorize(&self, bearer: Option<&str>) -> mnemo_core::Result<()> {
        match (&self.token, bearer) {
            (None, _) => Err(MnemoError::authorization("no insight token is configured")),
            (Some(_), None) => Err(MnemoError::authorization("missing bearer token")),
            (Some(expected), Some(given)) => {
                if constant_time_eq(expected.as_bytes(), given.as_bytes()) {
                    Ok(())
                } else {
                    Err(MnemoError::authorization("wrong bearer token"))
                }
            }
        }
    }

    /// Authenticates, parses and analyzes one event.
    ///
    /// The credential is checked before the body is even parsed, so a
    /// rejected caller never creates a session or triggers analysis.
    pub async fn ingest(
        &self,
        body: &[u8],
        bearer: Option<&str>,
    ) -> Result<SessionId, InsightRejection> {
        if let Err(e) = self.authorize(bearer) {
            tracing::warn!("[Insight] Rejected event: {}", e);
            return Err(e.into());
        }

        let event = InsightEvent::from_slice(body).map_err(|e| {
            tracing::warn!("[Insight] Malformed event: {}", e);
            InsightRejection::Malformed(e.to_string())
        })?;

        let outcome = self.orchestrator.ingest_insight(&event).await?;

        match outcome {
            WorkflowOutcome::Proposed {
                session_id,
                proposal,
                revision,
                version,
            } => {
                let mut reply = render_proposal(&session_id, &proposal, revision, version);
                reply.text = format!(
                    "💡 New insight ({}) for {}\n\n{}",
                    event.kind.trim(),
                    event.project.trim(),
                    reply.text
                );

                if let Err(e) = self.delivery.send(reply).await {
                    tracing::error!("[Insight] Could not deliver {}: {}", session_id, e);
                    // Nobody can decide on a proposal that was never shown.
                    if let Err(cleanup) = self
                        .orchestrator
                        .decide(&session_id, Decision::Cancel)
                        .await
                    {
                        tracing::warn!(
                            "[Insight] Could not drop undelivered {}: {}",
                            session_id,
                            cleanup
                        );
                    }
                    return Err(InsightRejection::Internal(format!("delivery failed: {e}")));
                }

                tracing::info!("[Insight] Accepted event as {}", session_id);
                Ok(session_id)
            }
            WorkflowOutcome::AnalysisFailed { reason, .. } => {
                Err(InsightRejection::AnalysisFailed(reason))
            }
            other => Err(InsightRejection::Internal(format!(
                "unexpected workflow outcome: {other:?}"
            ))),
        }
    }
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

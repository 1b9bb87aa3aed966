//! InteractiveAdapter - the chat front door.
//!
//! Authenticates the single allowed identity, turns voice into text, routes
//! text and button presses to the orchestrator, and renders the outcome back
//! to the chat.

use super::render::{ANALYZING_NOTICE, TRANSCRIBING_NOTICE, render_outcome};
use crate::workflow::WorkflowOrchestrator;
use mnemo_core::Result;
use mnemo_core::decision::Decision;
use mnemo_core::reply::{Reply, ReplyButton, ReplyChannel};
use mnemo_core::session::{Identity, SessionId};
use mnemo_core::speech::{Transcriber, VoiceClip};
use std::sync::Arc;

pub const GREETING: &str = "👋 Send me a text or a voice message and I will suggest where to save it in your knowledge base.";
pub const ACCESS_DENIED: &str = "Access denied.";

/// Transport-neutral inbound chat event.
#[derive(Debug, Clone)]
pub enum InteractiveEvent {
    Text { identity: Identity, text: String },
    Voice { identity: Identity, clip: VoiceClip },
    Button { identity: Identity, button: ReplyButton },
    /// `/start`
    Start { identity: Identity },
    /// `/cancel`: drops the identity's own pending proposal.
    Cancel { identity: Identity },
}

impl InteractiveEvent {
    pub fn identity(&self) -> Identity {
        match self {
            InteractiveEvent::Text { identity, .. }
            | InteractiveEvent::Voice { identity, .. }
            | InteractiveEvent::Button { identity, .. }
            | InteractiveEvent::Start { identity }
            | InteractiveEvent::Cancel { identity } => *identity,
        }
    }
}

pub struct InteractiveAdapter {
    allowed: Identity,
    orchestrator: Arc<WorkflowOrchestrator>,
    transcriber: Arc<dyn Transcriber>,
}

impl InteractiveAdapter {
    pub fn new(
        allowed: Identity,
        orchestrator: Arc<WorkflowOrchestrator>,
        transcriber: Arc<dyn Transcriber>,
    ) -> Self {
        Self {
            allowed,
            orchestrator,
            transcriber,
        }
    }

    pub fn is_authorized(&self, identity: Identity) -> bool {
        identity == self.allowed
    }

    /// Handles one event, sending every reply through `channel`.
    ///
    /// Events from any identity other than the allowed one are dropped
    /// without a reply, except `/start`, which answers "Access denied.".
    pub async fn handle(&self, event: InteractiveEvent, channel: &dyn ReplyChannel) -> Result<()> {
        let identity = event.identity();
        if !self.is_authorized(identity) {
            tracing::warn!("[Interactive] Ignoring event from unauthorized identity {}", identity);
            if matches!(event, InteractiveEvent::Start { .. }) {
                channel.send(Reply::text(ACCESS_DENIED)).await?;
            }
            return Ok(());
        }

        match event {
            InteractiveEvent::Start { .. } => channel.send(Reply::text(GREETING)).await,
            InteractiveEvent::Cancel { identity } => {
                let outcome = self
                    .orchestrator
                    .decide(&SessionId::for_identity(identity), Decision::Cancel)
                    .await?;
                send_outcome(channel, render_outcome(&outcome)).await
            }
            InteractiveEvent::Text { identity, text } => {
                self.handle_text(identity, &text, channel).await
            }
            InteractiveEvent::Voice { identity, clip } => {
                channel.send(Reply::text(TRANSCRIBING_NOTICE)).await?;
                let text = match self.transcriber.transcribe(clip).await {
                    Ok(text) => text,
                    Err(e) => {
                        tracing::warn!("[Interactive] Transcription failed: {}", e);
                        return channel
                            .send(Reply::text(format!("❌ Could not transcribe the voice message: {e}")))
                            .await;
                    }
                };
                if text.trim().is_empty() {
                    return channel
                        .send(Reply::text("❌ No speech recognized in the voice message."))
                        .await;
                }
                channel.send(Reply::text(format!("🎤 Recognized: {text}"))).await?;
                self.handle_text(identity, &text, channel).await
            }
            InteractiveEvent::Button { identity, button } => {
                let outcome = self.orchestrator.press(identity, &button).await?;
                send_outcome(channel, render_outcome(&outcome)).await
            }
        }
    }

    async fn handle_text(
        &self,
        identity: Identity,
        text: &str,
        channel: &dyn ReplyChannel,
    ) -> Result<()> {
        if text.trim().is_empty() {
            return Ok(());
        }
        channel.send(Reply::text(ANALYZING_NOTICE)).await?;
        let outcome = self.orchestrator.handle_text(identity, text).await?;
        send_outcome(channel, render_outcome(&outcome)).await
    }
}

async fn send_outcome(channel: &dyn ReplyChannel, reply: Option<Reply>) -> Result<()> {
    match reply {
        Some(reply) => channel.send(reply).await,
        None => Ok(()),
    }
}

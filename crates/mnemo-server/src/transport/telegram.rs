//! Telegram long-poll loop feeding the interactive adapter.

use async_trait::async_trait;
use mnemo_application::{InteractiveAdapter, InteractiveEvent};
use mnemo_core::Result;
use mnemo_core::reply::{Reply, ReplyButton, ReplyChannel, ReplyKind};
use mnemo_core::session::Identity;
use mnemo_core::speech::VoiceClip;
use mnemo_interaction::TelegramClient;
use mnemo_interaction::telegram::Update;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

const RETRY_DELAY: Duration = Duration::from_secs(5);

/// Replies into one chat. Resolutions edit the proposal message the button
/// belonged to, so stale buttons disappear.
pub struct TelegramReplyChannel {
    client: TelegramClient,
    chat_id: i64,
    source_message_id: Option<i64>,
}

impl TelegramReplyChannel {
    pub fn to_chat(client: TelegramClient, chat_id: i64) -> Self {
        Self {
            client,
            chat_id,
            source_message_id: None,
        }
    }

    fn for_message(client: TelegramClient, chat_id: i64, message_id: i64) -> Self {
        Self {
            client,
            chat_id,
            source_message_id: Some(message_id),
        }
    }
}

#[async_trait]
impl ReplyChannel for TelegramReplyChannel {
    async fn send(&self, reply: Reply) -> Result<()> {
        if reply.kind == ReplyKind::Resolution
            && let Some(message_id) = self.source_message_id
        {
            match self
                .client
                .edit_message_text(self.chat_id, message_id, &reply)
                .await
            {
                Ok(()) => return Ok(()),
                Err(e) => {
                    tracing::debug!("[Telegram] Edit failed, sending instead: {}", e);
                }
            }
        }
        self.client.send_message(self.chat_id, &reply).await
    }
}

/// An update reduced to what the dispatcher needs.
#[derive(Debug, Clone, PartialEq)]
pub enum Inbound {
    Text {
        identity: Identity,
        chat_id: i64,
        text: String,
    },
    Start {
        identity: Identity,
        chat_id: i64,
    },
    Cancel {
        identity: Identity,
        chat_id: i64,
    },
    Voice {
        identity: Identity,
        chat_id: i64,
        file_id: String,
        mime_type: Option<String>,
    },
    Button {
        identity: Identity,
        chat_id: i64,
        message_id: i64,
        callback_id: String,
        data: String,
    },
}

impl Inbound {
    fn identity(&self) -> Identity {
        match self {
            Inbound::Text { identity, .. }
            | Inbound::Start { identity, .. }
            | Inbound::Cancel { identity, .. }
            | Inbound::Voice { identity, .. }
            | Inbound::Button { identity, .. } => *identity,
        }
    }
}

/// Matches `/name` and `/name@botname`.
fn is_command(text: &str, name: &str) -> bool {
    let first = text.split_whitespace().next().unwrap_or_default();
    let command = first.split('@').next().unwrap_or_default();
    command.strip_prefix('/') == Some(name)
}

pub fn classify(update: &Update) -> Option<Inbound> {
    if let Some(query) = &update.callback_query {
        let message = query.message.as_ref()?;
        return Some(Inbound::Button {
            identity: Identity(query.from.id),
            chat_id: message.chat.id,
            message_id: message.message_id,
            callback_id: query.id.clone(),
            data: query.data.clone()?,
        });
    }

    let message = update.message.as_ref()?;
    let identity = Identity(message.from.as_ref()?.id);
    let chat_id = message.chat.id;

    if let Some(voice) = &message.voice {
        return Some(Inbound::Voice {
            identity,
            chat_id,
            file_id: voice.file_id.clone(),
            mime_type: voice.mime_type.clone(),
        });
    }

    let text = message.text.as_deref()?.trim();
    if text.is_empty() {
        return None;
    }
    if is_command(text, "start") {
        return Some(Inbound::Start { identity, chat_id });
    }
    if is_command(text, "cancel") {
        return Some(Inbound::Cancel { identity, chat_id });
    }
    Some(Inbound::Text {
        identity,
        chat_id,
        text: text.to_string(),
    })
}

async fn dispatch(
    client: &TelegramClient,
    adapter: &InteractiveAdapter,
    inbound: Inbound,
) -> Result<()> {
    let identity = inbound.identity();

    let (event, channel) = match inbound {
        Inbound::Text {
            chat_id, text, ..
        } => (
            InteractiveEvent::Text { identity, text },
            TelegramReplyChannel::to_chat(client.clone(), chat_id),
        ),
        Inbound::Start { chat_id, .. } => (
            InteractiveEvent::Start { identity },
            TelegramReplyChannel::to_chat(client.clone(), chat_id),
        ),
        Inbound::Cancel { chat_id, .. } => (
            InteractiveEvent::Cancel { identity },
            TelegramReplyChannel::to_chat(client.clone(), chat_id),
        ),
        Inbound::Voice {
            chat_id,
            file_id,
            mime_type,
            ..
        } => {
            // Skip the download entirely for strangers.
            if !adapter.is_authorized(identity) {
                tracing::warn!("[Telegram] Ignoring voice from unauthorized identity {}", identity);
                return Ok(());
            }
            let bytes = client.download_file(&file_id).await?;
            let clip = VoiceClip {
                bytes,
                file_name: "voice.ogg".to_string(),
                mime_type: mime_type.unwrap_or_else(|| "audio/ogg".to_string()),
            };
            (
                InteractiveEvent::Voice { identity, clip },
                TelegramReplyChannel::to_chat(client.clone(), chat_id),
            )
        }
        Inbound::Button {
            chat_id,
            message_id,
            callback_id,
            data,
            ..
        } => {
            if let Err(e) = client.answer_callback_query(&callback_id).await {
                tracing::debug!("[Telegram] answerCallbackQuery failed: {}", e);
            }
            let Some(button) = ReplyButton::parse_callback_data(&data) else {
                tracing::warn!("[Telegram] Unrecognized callback data '{}'", data);
                return Ok(());
            };
            (
                InteractiveEvent::Button { identity, button },
                TelegramReplyChannel::for_message(client.clone(), chat_id, message_id),
            )
        }
    };

    adapter.handle(event, &channel).await
}

/// Long-polls for updates until `shutdown` fires. Each update is handled on
/// its own task so a slow analysis never blocks button presses.
pub async fn run_polling(
    client: TelegramClient,
    adapter: Arc<InteractiveAdapter>,
    poll_timeout: Duration,
    shutdown: CancellationToken,
) {
    let mut offset = 0i64;
    tracing::info!("[Telegram] Polling for updates");

    loop {
        let updates = tokio::select! {
            _ = shutdown.cancelled() => break,
            result = client.get_updates(offset, poll_timeout) => result,
        };

        let updates = match updates {
            Ok(updates) => updates,
            Err(e) => {
                tracing::warn!("[Telegram] getUpdates failed: {}", e);
                tokio::select! {
                    _ = shutdown.cancelled() => break,
                    _ = tokio::time::sleep(RETRY_DELAY) => continue,
                }
            }
        };

        for update in updates {
            offset = offset.max(update.update_id + 1);
            let Some(inbound) = classify(&update) else {
                continue;
            };
            let client = client.clone();
            let adapter = adapter.clone();
            tokio::spawn(async move {
                if let Err(e) = dispatch(&client, &adapter, inbound).await {
                    tracing::error!("[Telegram] Failed to handle update: {}", e);
                }
            });
        }
    }

    tracing::info!("[Telegram] Polling stopped");
}

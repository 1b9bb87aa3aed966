//! Minimal Telegram Bot API client.
//!
//! Only the calls the chat transport needs: long polling, sending and
//! editing messages with inline keyboards, acknowledging button presses, and
//! downloading voice files.

use mnemo_core::reply::{Reply, ReplyButton};
use mnemo_core::{MnemoError, Result};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::time::Duration;

const API_BASE: &str = "https://api.telegram.org";

/// Envelope every Bot API response is wrapped in.
#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    result: Option<T>,
    #[serde(default)]
    description: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Update {
    pub update_id: i64,
    #[serde(default)]
    pub message: Option<Message>,
    #[serde(default)]
    pub callback_query: Option<CallbackQuery>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Message {
    pub message_id: i64,
    pub chat: Chat,
    #[serde(default)]
    pub from: Option<User>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub voice: Option<Voice>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Chat {
    pub id: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct User {
    pub id: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Voice {
    pub file_id: String,
    #[serde(default)]
    pub mime_type: Option<String>,
    #[serde(default)]
    pub duration: Option<u32>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CallbackQuery {
    pub id: String,
    pub from: User,
    #[serde(default)]
    pub message: Option<Message>,
    #[serde(default)]
    pub data: Option<String>,
}

#[derive(Debug, Deserialize)]
struct File {
    #[serde(default)]
    file_path: Option<String>,
}

#[derive(Debug, Serialize, PartialEq)]
struct InlineButton {
    text: String,
    callback_data: String,
}

/// Lays the reply's buttons out as a single inline keyboard row.
fn reply_markup(buttons: &[ReplyButton]) -> Option<Value> {
    if buttons.is_empty() {
        return None;
    }
    let row: Vec<InlineButton> = buttons
        .iter()
        .map(|button| InlineButton {
            text: button.label().to_string(),
            callback_data: button.callback_data(),
        })
        .collect();
    Some(json!({ "inline_keyboard": [row] }))
}

#[derive(Clone)]
pub struct TelegramClient {
    client: Client,
    token: String,
    api_base: String,
}

impl TelegramClient {
    /// `poll_timeout` is the long-poll window; the HTTP timeout is set a bit
    /// above it so the server answers first.
    pub fn new(token: impl Into<String>, poll_timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(poll_timeout + Duration::from_secs(10))
            .build()
            .map_err(|e| MnemoError::transport(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            token: token.into(),
            api_base: API_BASE.to_string(),
        })
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/bot{}/{}", self.api_base, self.token, method)
    }

    async fn call<T: DeserializeOwned>(&self, method: &str, body: Value) -> Result<T> {
        let response = self
            .client
            .post(self.method_url(method))
            .json(&body)
            .send()
            .await
            // reqwest errors embed the URL, which contains the token
            .map_err(|e| MnemoError::transport(format!("telegram {method} failed: {}", e.without_url())))?;

        let envelope: ApiResponse<T> = response.json().await.map_err(|e| {
            MnemoError::transport(format!("telegram {method} returned unreadable body: {}", e.without_url()))
        })?;

        if !envelope.ok {
            return Err(MnemoError::transport(format!(
                "telegram {method} rejected: {}",
                envelope.description.unwrap_or_else(|| "no description".to_string())
            )));
        }
        envelope
            .result
            .ok_or_else(|| MnemoError::transport(format!("telegram {method} returned no result")))
    }

    /// Long-polls for updates after `offset`.
    pub async fn get_updates(&self, offset: i64, timeout: Duration) -> Result<Vec<Update>> {
        self.call(
            "getUpdates",
            json!({
                "offset": offset,
                "timeout": timeout.as_secs(),
                "allowed_updates": ["message", "callback_query"],
            }),
        )
        .await
    }

    pub async fn send_message(&self, chat_id: i64, reply: &Reply) -> Result<()> {
        let mut body = json!({ "chat_id": chat_id, "text": reply.text });
        if let Some(markup) = reply_markup(&reply.buttons) {
            body["reply_markup"] = markup;
        }
        let _: Value = self.call("sendMessage", body).await?;
        Ok(())
    }

    /// Replaces the text (and keyboard) of an existing message.
    pub async fn edit_message_text(&self, chat_id: i64, message_id: i64, reply: &Reply) -> Result<()> {
        let mut body = json!({
            "chat_id": chat_id,
            "message_id": message_id,
            "text": reply.text,
        });
        if let Some(markup) = reply_markup(&reply.buttons) {
            body["reply_markup"] = markup;
        }
        let _: Value = self.call("editMessageText", body).await?;
        Ok(())
    }

    pub async fn answer_callback_query(&self, callback_query_id: &str) -> Result<()> {
        let _: Value = self
            .call(
                "answerCallbackQuery",
                json!({ "callback_query_id": callback_query_id }),
            )
            .await?;
        Ok(())
    }

    /// Resolves `file_id` and downloads the file's bytes.
    pub async fn download_file(&self, file_id: &str) -> Result<Vec<u8>> {
        let file: File = self.call("getFile", json!({ "file_id": file_id })).await?;
        let file_path = file
            .file_path
            .ok_or_else(|| MnemoError::transport("telegram file has no download path"))?;

        let url = format!("{}/file/bot{}/{}", self.api_base, self.token, file_path);
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| MnemoError::transport(format!("file download failed: {}", e.without_url())))?;

        if !response.status().is_success() {
            return Err(MnemoError::transport(format!(
                "file download failed with {}",
                response.status()
            )));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| MnemoError::transport(format!("file download interrupted: {}", e.without_url())))?;
        Ok(bytes.to_vec())
    }
}

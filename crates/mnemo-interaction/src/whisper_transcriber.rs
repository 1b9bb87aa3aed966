//! WhisperTranscriber - speech-to-text through the OpenAI transcription API.

use crate::http_error::{map_http_error, parse_retry_after};
use async_trait::async_trait;
use mnemo_core::config::SpeechConfig;
use mnemo_core::speech::{Transcriber, VoiceClip};
use mnemo_core::{MnemoError, Result};
use reqwest::Client;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use std::time::Duration;

#[derive(Clone, Debug)]
pub struct WhisperTranscriber {
    client: Client,
    api_key: String,
    model: String,
    url: String,
    timeout: Duration,
    language: Option<String>,
}

impl WhisperTranscriber {
    pub fn new(
        api_key: impl Into<String>,
        model: impl Into<String>,
        url: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| MnemoError::transport(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            api_key: api_key.into(),
            model: model.into(),
            url: url.into(),
            timeout,
            language: None,
        })
    }

    pub fn from_config(config: &SpeechConfig) -> Result<Self> {
        let api_key = config
            .api_key
            .clone()
            .ok_or_else(|| MnemoError::config("speech.api_key is not set"))?;

        Ok(Self::new(
            api_key,
            config.model.clone(),
            config.base_url.clone(),
            Duration::from_secs(config.timeout_secs),
        )?
        .with_language(config.language.clone()))
    }

    /// Sets the language hint. Blank values mean auto-detect.
    pub fn with_language(mut self, language: Option<String>) -> Self {
        self.language = language.filter(|l| !l.trim().is_empty());
        self
    }

    fn build_form(&self, clip: VoiceClip) -> Result<Form> {
        let part = Part::bytes(clip.bytes)
            .file_name(clip.file_name)
            .mime_str(&clip.mime_type)
            .map_err(|e| MnemoError::transport(format!("invalid audio mime type: {e}")))?;

        let mut form = Form::new()
            .part("file", part)
            .text("model", self.model.clone());
        if let Some(language) = &self.language {
            form = form.text("language", language.clone());
        }
        Ok(form)
    }
}

#[derive(Deserialize)]
struct TranscriptionResponse {
    text: String,
}

#[async_trait]
impl Transcriber for WhisperTranscriber {
    async fn transcribe(&self, clip: VoiceClip) -> Result<String> {
        let size = clip.bytes.len();
        let form = self.build_form(clip)?;

        tracing::debug!("[Speech] Transcribing {} bytes with {}", size, self.model);
        let response = self
            .client
            .post(&self.url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .multipart(form)
            .send()
            .await
            .map_err(|err| {
                if err.is_timeout() {
                    MnemoError::timeout("transcription request", self.timeout.as_secs())
                } else {
                    MnemoError::transport(format!("transcription request failed: {err}"))
                }
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let retry_after = parse_retry_after(response.headers().get("retry-after"));
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to read transcription error body".to_string());
            return Err(map_http_error("transcription service", status, body, retry_after));
        }

        let parsed: TranscriptionResponse = response
            .json()
            .await
            .map_err(|e| MnemoError::transport(format!("unreadable transcription response: {e}")))?;

        Ok(parsed.text.trim().to_string())
    }
}

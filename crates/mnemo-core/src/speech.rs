//! Speech-to-text collaborator interface.

use crate::error::Result;
use async_trait::async_trait;

/// Audio payload handed to a [`Transcriber`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoiceClip {
    pub bytes: Vec<u8>,
    /// File name hint including extension (e.g. `voice.ogg`); services use it
    /// to detect the container format.
    pub file_name: String,
    pub mime_type: String,
}

/// Best-effort transcription of recorded speech.
#[async_trait]
pub trait Transcriber: Send + Sync {
    async fn transcribe(&self, clip: VoiceClip) -> Result<String>;
}

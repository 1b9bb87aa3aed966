//! Network collaborators for mnemo.
//!
//! - [`OpenRouterAnalyzer`]: text → proposal via an OpenAI-compatible chat API
//! - [`WhisperTranscriber`]: voice → text via the audio transcription API
//! - [`TelegramClient`]: the Bot API calls used by the interactive transport

mod http_error;
pub mod openrouter_analyzer;
pub mod prompt;
pub mod telegram;
pub mod whisper_transcriber;

pub use openrouter_analyzer::OpenRouterAnalyzer;
pub use telegram::TelegramClient;
pub use whisper_transcriber::WhisperTranscriber;

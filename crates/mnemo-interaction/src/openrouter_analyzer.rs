//! OpenRouterAnalyzer - proposal generation through an OpenAI-compatible
//! chat completions endpoint (OpenRouter by default).

use crate::http_error::{map_http_error, parse_retry_after};
use crate::prompt::render_analysis_prompt;
use async_trait::async_trait;
use mnemo_core::analysis::{AnalysisRequest, Analyzer};
use mnemo_core::config::AnalysisConfig;
use mnemo_core::proposal::{Proposal, RawProposal};
use mnemo_core::{MnemoError, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Analyzer that talks to a chat completions HTTP API.
#[derive(Clone)]
pub struct OpenRouterAnalyzer {
    client: Client,
    api_key: String,
    model: String,
    url: String,
    timeout: Duration,
    temperature: f32,
}

impl OpenRouterAnalyzer {
    /// Creates an analyzer with the given credentials and request timeout.
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
            temperature: 0.3,
        })
    }

    /// Builds an analyzer from the `[analysis]` config section.
    pub fn from_config(config: &AnalysisConfig) -> Result<Self> {
        let api_key = config
            .api_key
            .clone()
            .ok_or_else(|| MnemoError::config("analysis.api_key is not set"))?;

        Ok(Self::new(
            api_key,
            config.model.clone(),
            config.base_url.clone(),
            Duration::from_secs(config.timeout_secs),
        )?
        .with_temperature(config.temperature))
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    async fn send_request(&self, body: &ChatCompletionRequest) -> Result<String> {
        let response = self
            .client
            .post(&self.url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("content-type", "application/json")
            .json(body)
            .send()
            .await
            .map_err(|err| {
                if err.is_timeout() {
                    MnemoError::timeout("analysis request", self.timeout.as_secs())
                } else {
                    MnemoError::transport(format!("analysis request failed: {err}"))
                }
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let retry_after = parse_retry_after(response.headers().get("retry-after"));
            let body_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to read analysis error body".to_string());
            return Err(map_http_error("analysis service", status, body_text, retry_after));
        }

        let parsed: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|err| MnemoError::analysis(format!("unreadable completion response: {err}")))?;

        extract_text_response(parsed)
    }
}

#[async_trait]
impl Analyzer for OpenRouterAnalyzer {
    async fn analyze(&self, request: &AnalysisRequest) -> Result<Proposal> {
        let prompt = render_analysis_prompt(request, &chrono::Local::now())?;

        let body = ChatCompletionRequest {
            model: self.model.clone(),
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: prompt,
            }],
            temperature: self.temperature,
        };

        tracing::debug!(
            "[Analyzer] Requesting proposal from {} (edit: {})",
            self.model,
            request.edit_instructions.is_some()
        );
        let reply = self.send_request(&body).await?;
        parse_model_reply(&reply)
    }
}

/// Extracts the outermost JSON object from a model reply.
///
/// Models often wrap JSON in prose or code fences, so the object is taken
/// from the first `{` to the last `}`.
pub fn extract_json_object(reply: &str) -> Option<&str> {
    let start = reply.find('{')?;
    let end = reply.rfind('}')?;
    (end > start).then(|| &reply[start..=end])
}

/// Turns a raw model reply into a validated proposal.
///
/// # Errors
///
/// `Analysis` when the reply has no JSON object, the JSON is malformed, or
/// no well-formed action survives validation.
pub fn parse_model_reply(reply: &str) -> Result<Proposal> {
    let json = extract_json_object(reply)
        .ok_or_else(|| MnemoError::analysis("model reply contains no JSON object"))?;

    let raw = RawProposal::from_json(json)
        .map_err(|e| MnemoError::analysis(format!("model reply is not a valid proposal: {e}")))?;

    raw.into_proposal()
}

#[derive(Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
}

#[derive(Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

fn extract_text_response(response: ChatCompletionResponse) -> Result<String> {
    response
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .ok_or_else(|| MnemoError::analysis("analysis service returned no content"))
}

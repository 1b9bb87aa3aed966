//! Shared mapping of HTTP failures onto `MnemoError`.

use mnemo_core::MnemoError;
use reqwest::StatusCode;
use reqwest::header::HeaderValue;
use serde::Deserialize;
use std::time::Duration;

#[derive(Deserialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: String,
}

/// Builds a transport error from a non-success response.
///
/// OpenAI-style `{"error": {"message": ...}}` bodies are unwrapped; anything
/// else is passed through verbatim.
pub(crate) fn map_http_error(
    service: &str,
    status: StatusCode,
    body: String,
    retry_after: Option<Duration>,
) -> MnemoError {
    let message = serde_json::from_str::<ErrorResponse>(&body)
        .map(|wrapper| wrapper.error.message)
        .unwrap_or(body);

    let retryable = matches!(
        status,
        StatusCode::TOO_MANY_REQUESTS
            | StatusCode::INTERNAL_SERVER_ERROR
            | StatusCode::BAD_GATEWAY
            | StatusCode::SERVICE_UNAVAILABLE
            | StatusCode::GATEWAY_TIMEOUT
    );

    let mut text = format!("{service} returned {status}: {message}");
    if retryable {
        text.push_str(" (retryable");
        if let Some(delay) = retry_after {
            text.push_str(&format!(", retry after {}s", delay.as_secs()));
        }
        text.push(')');
    }
    MnemoError::transport(text)
}

pub(crate) fn parse_retry_after(header: Option<&HeaderValue>) -> Option<Duration> {
    let value = header?.to_str().ok()?;
    if let Ok(seconds) = value.parse::<u64>() {
        return Some(Duration::from_secs(seconds));
    }

    // Retry-After HTTP-date parsing is omitted for simplicity
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openai_style_body_is_unwrapped() {
        let err = map_http_error(
            "OpenRouter",
            StatusCode::UNAUTHORIZED,
            r#"{"error": {"message": "No auth credentials found", "code": 401}}"#.to_string(),
            None,
        );
        let text = err.to_string();
        assert!(text.contains("No auth credentials found"));
        assert!(!text.contains("retryable"));
    }

    #[test]
    fn test_rate_limit_is_retryable() {
        let err = map_http_error(
            "Whisper",
            StatusCode::TOO_MANY_REQUESTS,
            "slow down".to_string(),
            Some(Duration::from_secs(7)),
        );
        assert!(err.to_string().contains("retry after 7s"));
    }

    #[test]
    fn test_parse_retry_after_seconds() {
        let header = HeaderValue::from_static("12");
        assert_eq!(parse_retry_after(Some(&header)), Some(Duration::from_secs(12)));
        let date = HeaderValue::from_static("Wed, 21 Oct 2015 07:28:00 GMT");
        assert_eq!(parse_retry_after(Some(&date)), None);
    }
}

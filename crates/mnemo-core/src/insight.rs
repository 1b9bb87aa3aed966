//! Externally pushed insight events.
//!
//! An insight is generated by another tool (a CI hook, a coding agent) rather
//! than typed by the user, but it enters the same confirmation workflow.

use crate::error::{MnemoError, Result};
use serde::{Deserialize, Serialize};

/// Structured insight payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InsightEvent {
    /// Category such as `bug`, `feature`, `decision`.
    #[serde(rename = "type")]
    pub kind: String,
    pub project: String,
    pub summary: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(
        default,
        rename = "filesChanged",
        alias = "files_changed",
        skip_serializing_if = "Option::is_none"
    )]
    pub files_changed: Option<Vec<String>>,
}

impl InsightEvent {
    /// Parses and validates an event body.
    ///
    /// # Errors
    ///
    /// Returns `Serialization` for invalid JSON, missing fields, or blank
    /// required fields. Every failure here means "malformed".
    pub fn from_slice(body: &[u8]) -> Result<Self> {
        let event: InsightEvent = serde_json::from_slice(body)?;
        event.validate()?;
        Ok(event)
    }

    fn validate(&self) -> Result<()> {
        let missing: Vec<&str> = [
            ("type", &self.kind),
            ("project", &self.project),
            ("summary", &self.summary),
        ]
        .into_iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| name)
        .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(MnemoError::Serialization {
                format: "JSON".to_string(),
                message: format!("empty required field(s): {}", missing.join(", ")),
            })
        }
    }

    /// Synthesizes the free-text block that is fed to analysis.
    pub fn to_capture_text(&self) -> String {
        let mut text = format!(
            "Insight ({}) for project {}:\n{}",
            self.kind.trim(),
            self.project.trim(),
            self.summary.trim()
        );

        if let Some(description) = self.description.as_deref().map(str::trim)
            && !description.is_empty()
        {
            text.push_str("\n\nDetails:\n");
            text.push_str(description);
        }

        if let Some(files) = &self.files_changed
            && !files.is_empty()
        {
            text.push_str("\n\nFiles changed:");
            for file in files {
                text.push_str("\n- ");
                text.push_str(file);
            }
        }

        text
    }
}

//! Wire form of a proposal as produced by the analysis model.
//!
//! The model is asked for `{"actions": [{"file", "action", "content",
//! "description"}], "summary"}` but is not trusted to comply, so every field
//! is optional here and each action is validated on its own.

use super::model::{Action, ActionMode, Proposal};
use crate::error::{MnemoError, Result};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// One action exactly as the model returned it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawAction {
    #[serde(default, alias = "path")]
    pub file: Option<String>,
    #[serde(default, alias = "mode")]
    pub action: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

impl RawAction {
    /// Validates this action, returning `None` when it is malformed.
    ///
    /// Well-formed means: non-empty path that stays inside the tree, a
    /// recognized mode, and content present (an empty string is allowed).
    pub fn validate(self) -> Option<Action> {
        let path = self.file?.trim().to_string();
        let mode = ActionMode::from_str(self.action?.trim()).ok()?;
        let content = self.content?;

        let description = self
            .description
            .map(|d| d.trim().to_string())
            .filter(|d| !d.is_empty())
            .unwrap_or_else(|| path.clone());

        let action = Action {
            path,
            mode,
            content,
            description,
        };

        action.has_contained_path().then_some(action)
    }
}

/// A proposal exactly as the model returned it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawProposal {
    /// Kept as untyped values so one malformed entry cannot fail the rest.
    #[serde(default)]
    pub actions: Vec<serde_json::Value>,
    #[serde(default)]
    pub summary: Option<String>,
}

impl RawProposal {
    /// Parses a JSON document into the raw wire form.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Drops malformed actions and builds a [`Proposal`].
    ///
    /// # Errors
    ///
    /// Returns [`MnemoError::Analysis`] when no well-formed action remains.
    pub fn into_proposal(self) -> Result<Proposal> {
        let total = self.actions.len();
        let actions: Vec<Action> = self
            .actions
            .into_iter()
            .filter_map(|value| serde_json::from_value::<RawAction>(value).ok())
            .filter_map(RawAction::validate)
            .collect();

        if actions.is_empty() {
            return Err(MnemoError::analysis(if total == 0 {
                "analysis returned no actions".to_string()
            } else {
                format!("all {total} proposed actions were malformed")
            }));
        }

        Ok(Proposal {
            actions,
            summary: self.summary.map(|s| s.trim().to_string()).unwrap_or_default(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_well_formed_proposal() {
        let raw = RawProposal::from_json(
            r#"{
                "actions": [
                    {"file": "daily/2024/05/01.md", "action": "append",
                     "content": "- bought milk", "description": "daily log"}
                ],
                "summary": "Logging a daily note"
            }"#,
        )
        .unwrap();

        let proposal = raw.into_proposal().unwrap();
        assert_eq!(proposal.summary, "Logging a daily note");
        assert_eq!(proposal.actions.len(), 1);
        assert_eq!(proposal.actions[0].path, "daily/2024/05/01.md");
        assert_eq!(proposal.actions[0].mode, ActionMode::Append);
        assert_eq!(proposal.actions[0].description, "daily log");
    }

    #[test]
    fn test_malformed_actions_are_dropped_individually() {
        let raw = RawProposal {
            actions: vec![
                json!({"file": "", "action": "append", "content": "x"}),
                json!({"file": "notes/a.md", "action": "delete", "content": "x"}),
                json!({"file": "notes/b.md", "action": "create"}),
                json!({"file": "../escape.md", "action": "create", "content": "x"}),
                json!("not an object"),
                json!({"path": "ideas/c.md", "mode": "create", "content": ""}),
            ],
            summary: Some("mixed".into()),
        };

        let proposal = raw.into_proposal().unwrap();
        assert_eq!(proposal.actions.len(), 1);
        assert_eq!(proposal.actions[0].path, "ideas/c.md");
        assert_eq!(proposal.actions[0].content, "");
        // Missing description falls back to the path
        assert_eq!(proposal.actions[0].description, "ideas/c.md");
    }

    #[test]
    fn test_empty_actions_is_analysis_failure() {
        let raw = RawProposal::from_json(r#"{"actions": [], "summary": "nothing"}"#).unwrap();
        let err = raw.into_proposal().unwrap_err();
        assert!(err.is_analysis());
    }

    #[test]
    fn test_all_malformed_is_analysis_failure() {
        let raw = RawProposal {
            actions: vec![json!({"file": "a.md"})],
            summary: None,
        };
        assert!(raw.into_proposal().unwrap_err().is_analysis());
    }

    #[test]
    fn test_missing_fields_default() {
        let raw = RawProposal::from_json("{}").unwrap();
        assert!(raw.actions.is_empty());
        assert!(raw.summary.is_none());
    }
}

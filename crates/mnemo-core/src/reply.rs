//! Outbound replies and the channel they are delivered through.

use crate::error::Result;
use crate::session::SessionId;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use strum::{Display, EnumString};

/// A decision button offered alongside a proposal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum Choice {
    Confirm,
    Edit,
    Cancel,
}

impl Choice {
    pub const ALL: [Choice; 3] = [Choice::Confirm, Choice::Edit, Choice::Cancel];

    pub fn label(&self) -> &'static str {
        match self {
            Choice::Confirm => "Save",
            Choice::Edit => "Edit",
            Choice::Cancel => "Cancel",
        }
    }
}

/// A button bound to one session, so insight and chat sessions never share
/// callbacks.
///
/// `version` pins the button to the proposal it was rendered with; a press
/// after that proposal was replaced is refused as stale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplyButton {
    pub choice: Choice,
    pub session_id: SessionId,
    #[serde(default)]
    pub version: Option<u32>,
}

impl ReplyButton {
    pub fn new(choice: Choice, session_id: SessionId) -> Self {
        Self {
            choice,
            session_id,
            version: None,
        }
    }

    pub fn at_version(mut self, version: u32) -> Self {
        self.version = Some(version);
        self
    }

    pub fn label(&self) -> &'static str {
        self.choice.label()
    }

    /// Encodes the button as `<choice>:<session_id>[:<version>]` for
    /// transport callbacks.
    pub fn callback_data(&self) -> String {
        match self.version {
            Some(version) => format!("{}:{}:{}", self.choice, self.session_id, version),
            None => format!("{}:{}", self.choice, self.session_id),
        }
    }

    /// Inverse of [`ReplyButton::callback_data`].
    pub fn parse_callback_data(data: &str) -> Option<Self> {
        let (choice, rest) = data.split_once(':')?;
        let choice = Choice::from_str(choice).ok()?;
        let (session_id, version) = match rest.split_once(':') {
            Some((session_id, version)) => (session_id, Some(version.parse::<u32>().ok()?)),
            None => (rest, None),
        };
        if session_id.is_empty() {
            return None;
        }
        Some(Self {
            choice,
            session_id: SessionId::new(session_id),
            version,
        })
    }
}

/// How a transport should place a reply relative to the message that
/// triggered it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ReplyKind {
    /// A new message.
    #[default]
    Message,
    /// Replaces the proposal message whose button was pressed (when the
    /// transport can edit messages); otherwise sent as a new message.
    Resolution,
}

/// A rendered message with optional decision buttons.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Reply {
    pub text: String,
    pub buttons: Vec<ReplyButton>,
    pub kind: ReplyKind,
}

impl Reply {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Default::default()
        }
    }

    pub fn resolution(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            buttons: Vec::new(),
            kind: ReplyKind::Resolution,
        }
    }

    pub fn with_buttons(mut self, buttons: Vec<ReplyButton>) -> Self {
        self.buttons = buttons;
        self
    }
}

/// Destination for rendered replies (a chat, a test recorder, ...).
#[async_trait]
pub trait ReplyChannel: Send + Sync {
    async fn send(&self, reply: Reply) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_callback_data_round_trip() {
        let button = ReplyButton::new(Choice::Edit, SessionId::new("evt-12-9f8e7d6c"));
        let data = button.callback_data();
        assert_eq!(data, "edit:evt-12-9f8e7d6c");
        assert_eq!(ReplyButton::parse_callback_data(&data), Some(button));
    }

    #[test]
    fn test_versioned_callback_data() {
        let button = ReplyButton::new(Choice::Confirm, SessionId::new("chat-42")).at_version(3);
        assert_eq!(button.callback_data(), "confirm:chat-42:3");
        assert_eq!(
            ReplyButton::parse_callback_data("confirm:chat-42:3"),
            Some(button)
        );
    }

    #[test]
    fn test_invalid_callback_data() {
        assert!(ReplyButton::parse_callback_data("confirm").is_none());
        assert!(ReplyButton::parse_callback_data("confirm:").is_none());
        assert!(ReplyButton::parse_callback_data("delete:chat-1").is_none());
        assert!(ReplyButton::parse_callback_data("confirm:chat-1:x").is_none());
        assert!(ReplyButton::parse_callback_data("confirm::2").is_none());
    }

    #[test]
    fn test_callback_data_fits_transport_limit() {
        // Chat transports commonly cap callback payloads at 64 bytes
        let button = ReplyButton::new(
            Choice::Confirm,
            SessionId::new("evt-18446744073709551615-0123456789abcdef"),
        )
        .at_version(u32::MAX);
        assert!(button.callback_data().len() <= 64);
    }
}

//! Analysis collaborator interface.
//!
//! Turns free text (optionally with edit instructions) into a [`Proposal`].

use crate::error::Result;
use crate::proposal::Proposal;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Input to one analysis call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisRequest {
    /// The raw captured text.
    pub text: String,
    /// Corrections supplied by the user for a previous proposal.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub edit_instructions: Option<String>,
}

impl AnalysisRequest {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            edit_instructions: None,
        }
    }

    pub fn with_edit_instructions(mut self, instructions: impl Into<String>) -> Self {
        self.edit_instructions = Some(instructions.into());
        self
    }
}

/// A service that proposes where and how to store a piece of text.
///
/// Implementations must map malformed service output (non-JSON, missing
/// fields, zero usable actions) to `MnemoError::Analysis`, never to an
/// empty `Proposal`.
#[async_trait]
pub trait Analyzer: Send + Sync {
    async fn analyze(&self, request: &AnalysisRequest) -> Result<Proposal>;
}

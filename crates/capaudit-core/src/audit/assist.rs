//! Optional assistant consultation requested by `agent_assist.yaml`.
//!
//! A capsule may ship
//!
//! ```yaml
//! agent_assist:
//!   enabled: true
//!   gpt_id: reflex-helper
//!   help_url: http://localhost:11434/gpt
//! ```
//!
//! in which case the auditor asks the configured [`Advisor`] why the capsule
//! failed validation and appends the reply to the audit trail.

use std::path::Path;

use serde::Deserialize;

use crate::Result;

/// Question put to the advisor.
pub const ASSIST_PROMPT: &str = "Why did this capsule fail validation?";

/// Error type returned by advisors.
pub type AdvisorError = Box<dyn std::error::Error + Send + Sync>;

/// Settings under the `agent_assist` key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct AgentAssist {
    /// Whether consultation is requested.
    #[serde(default)]
    pub enabled: bool,

    /// Identifier of the assistant to consult.
    #[serde(default)]
    pub gpt_id: Option<String>,

    /// Endpoint overriding the default hook endpoint.
    #[serde(default)]
    pub help_url: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct AssistFile {
    #[serde(default)]
    agent_assist: AgentAssist,
}

impl AgentAssist {
    /// Parses the content of an `agent_assist.yaml` file.
    pub fn from_yaml_str(text: &str) -> Result<Self> {
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        let file: AssistFile = serde_yaml::from_str(text)?;
        Ok(file.agent_assist)
    }

    /// Reads and parses an `agent_assist.yaml` file.
    pub fn load(path: &Path) -> Result<Self> {
        Self::from_yaml_str(&std::fs::read_to_string(path)?)
    }

    /// Returns the assistant id when consultation is enabled.
    #[must_use]
    pub fn active_id(&self) -> Option<&str> {
        self.gpt_id.as_deref().filter(|_| self.enabled)
    }
}

/// One consultation request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AssistRequest<'a> {
    /// Assistant identifier from the capsule.
    pub gpt_id: &'a str,
    /// Endpoint to contact.
    pub endpoint: &'a str,
    /// Prompt text.
    pub prompt: &'a str,
}

/// Something that can answer an [`AssistRequest`].
///
/// Implementations must not panic; failures are returned and written to the
/// audit trail as text.
pub trait Advisor {
    /// Returns the assistant's reply.
    fn advise(&self, request: &AssistRequest<'_>) -> std::result::Result<String, AdvisorError>;
}

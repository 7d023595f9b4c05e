//! Capsule metadata documents written during a repair pass.

use std::path::Path;

use serde::Deserialize;
use serde::Serialize;

use crate::Result;
use crate::ValidationScore;

/// Metadata listing discovered sources and the audit score.
pub const REFLECT_NAME: &str = "reflect.yaml";

/// Agent personality document, injected when absent.
pub const PERSONALITY_NAME: &str = "agent_personality.yaml";

/// Optional agent-assist settings shipped inside a capsule.
pub const ASSIST_NAME: &str = "agent_assist.yaml";

/// Per-archive summary bundled with the repaired capsule.
pub const SUMMARY_NAME: &str = "audit_summary.json";

/// Aggregate summary written to the output directory.
pub const AGGREGATE_SUMMARY_NAME: &str = "audit_summary_all.json";

/// Assistant endpoint recorded in every regenerated `reflect.yaml`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GptHook {
    /// HTTP endpoint accepting `{"prompt": ...}`.
    pub endpoint: String,
    /// Persona definition file name.
    pub persona_file: String,
    /// Prompt used when the capsule gives none.
    pub fallback_prompt: String,
}

impl Default for GptHook {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:11434/gpt".to_string(),
            persona_file: "aura-persona.json".to_string(),
            fallback_prompt: "Describe any problems in this capsule.".to_string(),
        }
    }
}

/// Settings under the `agent_personality` key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonalitySettings {
    /// Behaviour mode.
    pub mode: String,
    /// Whether memory hooks are enabled.
    pub memory_hooks: bool,
    /// Whether the dashboard UI is enabled.
    pub dashboard_ui: bool,
}

/// Content of `agent_personality.yaml`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonalityDocument {
    /// Personality settings.
    pub agent_personality: PersonalitySettings,
}

impl Default for PersonalityDocument {
    fn default() -> Self {
        Self {
            agent_personality: PersonalitySettings {
                mode: "reflexive".to_string(),
                memory_hooks: true,
                dashboard_ui: true,
            },
        }
    }
}

/// Fixed documents and labels injected into repaired capsules.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapsuleTemplates {
    /// Value of the `capsule` key in `reflect.yaml`.
    pub capsule_label: String,
    /// Value of the `gpt_hook` key in `reflect.yaml`.
    pub gpt_hook: GptHook,
    /// Personality written when a capsule has none.
    pub personality: PersonalityDocument,
}

impl Default for CapsuleTemplates {
    fn default() -> Self {
        Self {
            capsule_label: "Auto-Repaired Reflex Capsule".to_string(),
            gpt_hook: GptHook::default(),
            personality: PersonalityDocument::default(),
        }
    }
}

/// Content of a regenerated `reflect.yaml`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReflectDocument {
    /// Capsule label.
    pub capsule: String,
    /// Discovered source files, relative to the capsule root.
    pub files: Vec<String>,
    /// Always `true` for regenerated documents.
    pub repaired: bool,
    /// Provenance stamp.
    pub repaired_by: String,
    /// Score of the manifest pass.
    pub score: ValidationScore,
    /// Assistant hook.
    pub gpt_hook: GptHook,
}

impl ReflectDocument {
    /// Builds a fresh document for a capsule.
    #[must_use]
    pub fn new(
        templates: &CapsuleTemplates,
        files: Vec<String>,
        repaired_by: String,
        score: ValidationScore,
    ) -> Self {
        Self {
            capsule: templates.capsule_label.clone(),
            files,
            repaired: true,
            repaired_by,
            score,
            gpt_hook: templates.gpt_hook.clone(),
        }
    }
}

/// Serializes `value` as YAML into `path`, replacing any previous content.
pub fn write_yaml<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let text = serde_yaml::to_string(value)?;
    std::fs::write(path, text)?;
    Ok(())
}

/// Serializes `value` as pretty JSON into `path`.
pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let text = serde_json::to_string_pretty(value)?;
    std::fs::write(path, text)?;
    Ok(())
}

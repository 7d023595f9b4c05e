//! Audit configuration and manifest validation policy.

use std::collections::BTreeSet;
use std::path::Path;
use std::path::PathBuf;

use serde::Deserialize;
use serde::Serialize;

use crate::AuditError;
use crate::Result;
use crate::audit::metadata::CapsuleTemplates;

/// Permission identifiers accepted without raising the permission risk.
pub const KNOWN_PERMISSIONS: &[&str] = &[
    "tabs",
    "activeTab",
    "storage",
    "scripting",
    "microphone",
    "camera",
    "clipboardRead",
    "clipboardWrite",
    "webRequest",
    "webNavigation",
    "notifications",
    "contextMenus",
    "idle",
    "windows",
    "debugger",
    "offscreen",
    "power",
];

/// Immutable policy the manifest validator is constructed with.
///
/// Every field has a default, so a policy file only needs to list what it
/// overrides.
///
/// # Examples
///
/// ```
/// use capaudit_core::ValidatorPolicy;
///
/// let policy = ValidatorPolicy::default();
/// assert!(policy.is_known_permission("tabs"));
/// assert!(!policy.is_known_permission("mystery_perm"));
/// assert_eq!(policy.provenance(), "Agent0 Auditor v1.0");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidatorPolicy {
    /// Permission identifiers considered safe.
    pub known_permissions: BTreeSet<String>,

    /// Value inserted when `name` is missing.
    pub default_name: String,

    /// Value inserted when `version` is missing.
    pub default_version: String,

    /// Value inserted when `manifest_version` is missing.
    pub default_manifest_version: u64,

    /// Tool name recorded in `repaired_by`.
    pub tool_name: String,

    /// Tool version recorded in `repaired_by`.
    pub tool_version: String,
}

impl Default for ValidatorPolicy {
    fn default() -> Self {
        Self {
            known_permissions: KNOWN_PERMISSIONS.iter().map(ToString::to_string).collect(),
            default_name: "Operator Extension".to_string(),
            default_version: "1.0".to_string(),
            default_manifest_version: 3,
            tool_name: "Agent0 Auditor".to_string(),
            tool_version: "1.0".to_string(),
        }
    }
}

impl ValidatorPolicy {
    /// Loads a policy from a YAML document, filling unspecified fields with
    /// defaults.
    pub fn from_yaml_str(text: &str) -> Result<Self> {
        let policy: Self = serde_yaml::from_str(text)?;
        policy.validate()?;
        Ok(policy)
    }

    /// Loads a policy from a YAML file.
    pub fn from_yaml_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&text)
    }

    /// Checks that the policy can produce a usable provenance stamp and
    /// defaults.
    pub fn validate(&self) -> Result<()> {
        if self.tool_name.trim().is_empty() {
            return Err(AuditError::InvalidConfig("tool_name must not be empty".into()));
        }
        if self.default_name.trim().is_empty() {
            return Err(AuditError::InvalidConfig("default_name must not be empty".into()));
        }
        if self.default_manifest_version == 0 {
            return Err(AuditError::InvalidConfig(
                "default_manifest_version must be positive".into(),
            ));
        }
        Ok(())
    }

    /// Returns whether `permission` is in the known set.
    #[must_use]
    pub fn is_known_permission(&self, permission: &str) -> bool {
        self.known_permissions.contains(permission)
    }

    /// Returns the `repaired_by` stamp, e.g. `Agent0 Auditor v1.0`.
    #[must_use]
    pub fn provenance(&self) -> String {
        format!("{} v{}", self.tool_name, self.tool_version)
    }
}

/// Configuration for a directory audit.
///
/// # Examples
///
/// ```
/// use capaudit_core::AuditConfig;
///
/// let config = AuditConfig::default()
///     .with_output_dir("/tmp/audited")
///     .with_compression_level(Some(9));
/// assert!(config.is_archive_name("capsule.camp"));
/// assert!(!config.is_archive_name("notes.txt"));
/// ```
#[derive(Debug, Clone)]
pub struct AuditConfig {
    /// Directory receiving `_REPAIRED` archives, their signatures and the
    /// aggregate summary.
    ///
    /// Default: `audited_capsules`.
    pub output_dir: PathBuf,

    /// Archive suffixes selected from the base directory, without the dot.
    ///
    /// Default: `["zip", "camp"]`.
    pub archive_extensions: Vec<String>,

    /// Prefix of the per-archive scratch directory created in the base
    /// directory.
    ///
    /// Default: `extracted_`.
    pub scratch_prefix: String,

    /// Extensions recorded as discovered sources in `reflect.yaml`.
    ///
    /// Default: `["js", "html", "py"]`.
    pub source_extensions: Vec<String>,

    /// Where to copy each original archive before it is processed.
    ///
    /// Default: `None`.
    pub backup_dir: Option<PathBuf>,

    /// Deflate level for repaired archives (1-9). `Some(0)` stores entries
    /// uncompressed.
    ///
    /// Default: `Some(6)`.
    pub compression_level: Option<u8>,

    /// Manifest validation policy.
    pub policy: ValidatorPolicy,

    /// Fixed documents injected into repaired capsules.
    pub templates: CapsuleTemplates,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("audited_capsules"),
            archive_extensions: vec!["zip".to_string(), "camp".to_string()],
            scratch_prefix: "extracted_".to_string(),
            source_extensions: vec!["js".to_string(), "html".to_string(), "py".to_string()],
            backup_dir: None,
            compression_level: Some(6),
            policy: ValidatorPolicy::default(),
            templates: CapsuleTemplates::default(),
        }
    }
}

impl AuditConfig {
    /// Sets the output directory.
    #[must_use]
    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = dir.into();
        self
    }

    /// Sets the backup directory.
    #[must_use]
    pub fn with_backup_dir(mut self, dir: Option<PathBuf>) -> Self {
        self.backup_dir = dir;
        self
    }

    /// Sets the compression level.
    #[must_use]
    pub fn with_compression_level(mut self, level: Option<u8>) -> Self {
        self.compression_level = level;
        self
    }

    /// Replaces the validation policy.
    #[must_use]
    pub fn with_policy(mut self, policy: ValidatorPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Checks the configuration for values that would make every audit fail.
    pub fn validate(&self) -> Result<()> {
        if self.archive_extensions.is_empty() {
            return Err(AuditError::InvalidConfig(
                "at least one archive extension is required".into(),
            ));
        }
        if self.scratch_prefix.is_empty() {
            return Err(AuditError::InvalidConfig("scratch prefix must not be empty".into()));
        }
        if let Some(level) = self.compression_level
            && level > 9
        {
            return Err(AuditError::InvalidConfig(format!(
                "compression level must be 0-9, got {level}"
            )));
        }
        self.policy.validate()
    }

    /// Returns whether a file name carries one of the archive suffixes.
    ///
    /// Comparison is case-insensitive.
    #[must_use]
    pub fn is_archive_name(&self, name: &str) -> bool {
        Path::new(name)
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| {
                self.archive_extensions
                    .iter()
                    .any(|allowed| allowed.eq_ignore_ascii_case(ext))
            })
    }

    /// Returns whether a path should be listed as a discovered source file.
    #[must_use]
    pub fn is_source_file(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| {
                self.source_extensions
                    .iter()
                    .any(|allowed| allowed.eq_ignore_ascii_case(ext))
            })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_default_policy() {
        let policy = ValidatorPolicy::default();
        assert_eq!(policy.known_permissions.len(), KNOWN_PERMISSIONS.len());
        assert_eq!(policy.default_name, "Operator Extension");
        assert_eq!(policy.default_version, "1.0");
        assert_eq!(policy.default_manifest_version, 3);
        assert!(policy.validate().is_ok());
    }

    #[test]
    fn test_permission_lookup_is_case_sensitive() {
        let policy = ValidatorPolicy::default();
        assert!(policy.is_known_permission("activeTab"));
        assert!(!policy.is_known_permission("activetab"));
    }

    #[test]
    fn test_policy_from_partial_yaml() {
        let policy = ValidatorPolicy::from_yaml_str(
            "known_permissions: [tabs, history]\ntool_name: Capsule Linter\n",
        )
        .unwrap();
        assert!(policy.is_known_permission("history"));
        assert!(!policy.is_known_permission("storage"));
        assert_eq!(policy.default_version, "1.0");
        assert_eq!(policy.provenance(), "Capsule Linter v1.0");
    }

    #[test]
    fn test_policy_rejects_empty_tool_name() {
        let result = ValidatorPolicy::from_yaml_str("tool_name: ''\n");
        assert!(matches!(result, Err(AuditError::InvalidConfig(_))));
    }

    #[test]
    fn test_policy_rejects_malformed_yaml() {
        let result = ValidatorPolicy::from_yaml_str("known_permissions: {");
        assert!(matches!(result, Err(AuditError::Serialization(_))));
    }

    #[test]
    fn test_archive_name_matching() {
        let config = AuditConfig::default();
        assert!(config.is_archive_name("ext.zip"));
        assert!(config.is_archive_name("Shrine.CAMP"));
        assert!(!config.is_archive_name("ext.zip.sig"));
        assert!(!config.is_archive_name("zip"));
    }

    #[test]
    fn test_source_file_matching() {
        let config = AuditConfig::default();
        assert!(config.is_source_file(Path::new("scripts/content.js")));
        assert!(config.is_source_file(Path::new("popup.HTML")));
        assert!(!config.is_source_file(Path::new("reflect.yaml")));
    }

    #[test]
    fn test_config_validation() {
        assert!(AuditConfig::default().validate().is_ok());

        let config = AuditConfig::default().with_compression_level(Some(12));
        assert!(config.validate().is_err());

        let mut config = AuditConfig::default();
        config.archive_extensions.clear();
        assert!(config.validate().is_err());
    }
}

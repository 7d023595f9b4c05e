//! Manifest validation and repair.
//!
//! A repair pass parses the manifest, fills required keys from the policy
//! defaults, classifies declared permissions, checks that referenced scripts
//! and pages exist in the extracted capsule, and stamps the result with the
//! tool provenance. Every finding is a score deduction; nothing here aborts
//! the caller except failing to read or write the manifest file itself.

use std::path::Component;
use std::path::Path;
use std::path::PathBuf;

use serde_json::Map;
use serde_json::Value;

use crate::AuditError;
use crate::RepairLog;
use crate::Result;
use crate::ValidatorPolicy;
use crate::manifest::score::ValidationScore;

/// File name of the capsule manifest.
pub const MANIFEST_NAME: &str = "manifest.json";

/// Key holding the provenance stamp.
pub const REPAIRED_BY_KEY: &str = "repaired_by";

/// Result of validating one manifest.
#[derive(Debug, Clone, PartialEq)]
pub struct ManifestValidation {
    /// Corrected manifest, or `None` when the input could not be parsed.
    pub manifest: Option<Map<String, Value>>,

    /// Score of this pass.
    pub score: ValidationScore,

    /// Declared permissions outside the known set, in declaration order.
    pub unknown_permissions: Vec<String>,

    /// Required keys that were filled with defaults.
    pub filled_keys: Vec<String>,

    /// Referenced paths that do not exist in the capsule.
    pub missing_files: Vec<String>,

    /// Parse error text when the manifest was malformed.
    pub parse_error: Option<String>,
}

impl ManifestValidation {
    fn unparseable(reason: String) -> Self {
        let mut score = ValidationScore::perfect();
        score.record_parse_failure();
        Self {
            manifest: None,
            score,
            unknown_permissions: Vec::new(),
            filled_keys: Vec::new(),
            missing_files: Vec::new(),
            parse_error: Some(reason),
        }
    }

    /// Returns whether the manifest parsed.
    #[must_use]
    pub fn is_parsed(&self) -> bool {
        self.manifest.is_some()
    }

    /// Renders the corrected manifest as pretty JSON (two-space indent).
    pub fn to_json_pretty(&self) -> Result<Option<String>> {
        self.manifest
            .as_ref()
            .map(|map| serde_json::to_string_pretty(map).map_err(AuditError::from))
            .transpose()
    }
}

/// Validates and repairs manifests against an injected [`ValidatorPolicy`].
///
/// # Examples
///
/// ```
/// use capaudit_core::ManifestValidator;
/// use capaudit_core::RepairLog;
/// use capaudit_core::ValidatorPolicy;
/// use std::path::Path;
///
/// let validator = ManifestValidator::new(ValidatorPolicy::default());
/// let mut log = RepairLog::in_memory();
/// let result = validator.validate(
///     br#"{"permissions": ["tabs", "mystery_perm"]}"#,
///     Path::new("/nonexistent"),
///     &mut log,
/// );
/// assert_eq!(result.score.total(), 65);
/// assert_eq!(result.unknown_permissions, vec!["mystery_perm"]);
/// ```
#[derive(Debug, Clone, Default)]
pub struct ManifestValidator {
    policy: ValidatorPolicy,
}

impl ManifestValidator {
    /// Creates a validator bound to `policy`.
    #[must_use]
    pub fn new(policy: ValidatorPolicy) -> Self {
        Self { policy }
    }

    /// Validates manifest bytes, resolving referenced files under
    /// `extracted_root`.
    ///
    /// Never fails: a malformed manifest yields integrity 0 and a total of
    /// 70 with no corrected manifest.
    pub fn validate(
        &self,
        manifest_bytes: &[u8],
        extracted_root: &Path,
        log: &mut RepairLog,
    ) -> ManifestValidation {
        let mut manifest = match parse_manifest(manifest_bytes) {
            Ok(map) => map,
            Err(err) => {
                let reason = err.context().unwrap_or("unreadable manifest").to_string();
                log.record(format!("JSON error: {reason}"));
                tracing::warn!(%reason, "manifest could not be parsed");
                return ManifestValidation::unparseable(reason);
            }
        };

        let mut score = ValidationScore::perfect();
        let filled_keys = self.fill_required_keys(&mut manifest, &mut score, log);
        normalize_permissions(&mut manifest, log);
        let unknown_permissions = self.classify_permissions(&manifest, &mut score, log);
        let missing_files = check_referenced_files(&manifest, extracted_root, &mut score, log);

        manifest.insert(
            REPAIRED_BY_KEY.to_string(),
            Value::String(self.policy.provenance()),
        );

        ManifestValidation {
            manifest: Some(manifest),
            score,
            unknown_permissions,
            filled_keys,
            missing_files,
            parse_error: None,
        }
    }

    /// Validates the manifest file at `manifest_path` and, unless `dry_run`,
    /// writes the corrected manifest back in place.
    ///
    /// # Errors
    ///
    /// Returns an error only if the file cannot be read or written.
    pub fn repair_file(
        &self,
        manifest_path: &Path,
        extracted_root: &Path,
        dry_run: bool,
        log: &mut RepairLog,
    ) -> Result<ManifestValidation> {
        let bytes = std::fs::read(manifest_path)?;
        let validation = self.validate(&bytes, extracted_root, log);

        if !dry_run && let Some(json) = validation.to_json_pretty()? {
            std::fs::write(manifest_path, json)?;
            tracing::debug!(path = %manifest_path.display(), "manifest rewritten");
        }

        Ok(validation)
    }

    fn fill_required_keys(
        &self,
        manifest: &mut Map<String, Value>,
        score: &mut ValidationScore,
        log: &mut RepairLog,
    ) -> Vec<String> {
        let defaults = [
            ("name", Value::String(self.policy.default_name.clone())),
            ("version", Value::String(self.policy.default_version.clone())),
            (
                "manifest_version",
                Value::from(self.policy.default_manifest_version),
            ),
        ];

        let mut filled = Vec::new();
        for (key, default) in defaults {
            if !manifest.contains_key(key) {
                manifest.insert(key.to_string(), default);
                log.record(format!("Missing key '{key}' filled."));
                score.record_missing_key();
                filled.push(key.to_string());
            }
        }
        filled
    }

    fn classify_permissions(
        &self,
        manifest: &Map<String, Value>,
        score: &mut ValidationScore,
        log: &mut RepairLog,
    ) -> Vec<String> {
        let Some(permissions) = manifest.get("permissions").and_then(Value::as_array) else {
            return Vec::new();
        };

        let mut unknown = Vec::new();
        for permission in permissions {
            let known = permission
                .as_str()
                .is_some_and(|p| self.policy.is_known_permission(p));
            if !known {
                let label = permission
                    .as_str()
                    .map_or_else(|| permission.to_string(), ToString::to_string);
                log.record(format!("Unknown permission: {label}"));
                score.record_unknown_permission();
                unknown.push(label);
            }
        }
        unknown
    }
}

fn parse_manifest(bytes: &[u8]) -> Result<Map<String, Value>> {
    match serde_json::from_slice::<Value>(bytes) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(other) => Err(AuditError::ManifestParse(format!(
            "expected a JSON object at the top level, found {}",
            json_kind(&other)
        ))),
        Err(e) => Err(AuditError::ManifestParse(e.to_string())),
    }
}

const fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Guarantees `permissions` is a list after repair.
fn normalize_permissions(manifest: &mut Map<String, Value>, log: &mut RepairLog) {
    match manifest.get("permissions") {
        Some(Value::Array(_)) => {}
        Some(other) => {
            log.record(format!(
                "Permissions replaced with an empty list (was {}).",
                json_kind(other)
            ));
            manifest.insert("permissions".to_string(), Value::Array(Vec::new()));
        }
        None => {
            manifest.insert("permissions".to_string(), Value::Array(Vec::new()));
        }
    }
}

fn check_referenced_files(
    manifest: &Map<String, Value>,
    root: &Path,
    score: &mut ValidationScore,
    log: &mut RepairLog,
) -> Vec<String> {
    let mut references: Vec<(&str, &str)> = Vec::new();

    if let Some(scripts) = manifest.get("content_scripts").and_then(Value::as_array) {
        for entry in scripts {
            let js = entry.get("js").and_then(Value::as_array);
            for path in js.into_iter().flatten().filter_map(Value::as_str) {
                references.push(("Content Script", path));
            }
        }
    }

    if let Some(worker) = manifest
        .get("background")
        .and_then(|bg| bg.get("service_worker"))
        .and_then(Value::as_str)
    {
        references.push(("Service Worker", worker));
    }

    if let Some(popup) = manifest
        .get("action")
        .and_then(|action| action.get("default_popup"))
        .and_then(Value::as_str)
    {
        references.push(("Popup HTML", popup));
    }

    let mut missing = Vec::new();
    for (label, relpath) in references {
        match resolve_reference(root, relpath) {
            Some(full) if full.is_file() => {
                log.record(format!("{label} found: {relpath}"));
            }
            Some(_) => {
                log.record(format!("{label} missing: {relpath}"));
                tracing::warn!(label, path = relpath, "referenced file missing");
                score.record_missing_file();
                missing.push(relpath.to_string());
            }
            None => {
                log.record(format!("{label} outside capsule: {relpath}"));
                tracing::warn!(label, path = relpath, "referenced file escapes capsule root");
                score.record_missing_file();
                missing.push(relpath.to_string());
            }
        }
    }
    missing
}

/// Joins a manifest-relative path onto `root`, refusing absolute paths and
/// parent traversal.
fn resolve_reference(root: &Path, relpath: &str) -> Option<PathBuf> {
    let relative = Path::new(relpath);
    let mut resolved = root.to_path_buf();
    for component in relative.components() {
        match component {
            Component::Normal(part) => resolved.push(part),
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => return None,
        }
    }
    Some(resolved)
}

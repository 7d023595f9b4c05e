//! Per-archive summaries and the batch result.

use std::collections::BTreeMap;
use std::path::Path;
use std::path::PathBuf;

use serde::Serialize;

use crate::Result;
use crate::ValidationScore;
use crate::audit::metadata::AGGREGATE_SUMMARY_NAME;
use crate::audit::metadata::write_json;

/// Audit result of one archive, bundled as `audit_summary.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RepairSummary {
    /// Original archive file name.
    pub archive: String,

    /// Score of the manifest pass, or the perfect score without a manifest.
    pub score: ValidationScore,

    /// Permissions outside the known set.
    pub unknown_permissions: Vec<String>,

    /// Referenced files absent from the capsule.
    pub missing_files: Vec<String>,

    /// Number of files in the scratch tree when the summary was taken.
    pub files: usize,

    /// Whether a repaired archive was produced.
    pub repaired: bool,

    /// Ambiguities and skipped entries worth an operator's attention.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub diagnostics: Vec<String>,
}

/// A successfully audited archive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArchiveAudit {
    /// Summary of the pass.
    pub summary: RepairSummary,

    /// Path of the `_REPAIRED` archive; `None` in dry runs.
    pub repaired_path: Option<PathBuf>,

    /// SHA-256 digest recorded in the sidecar; `None` in dry runs.
    pub signature: Option<String>,
}

/// Tagged outcome of one archive in a batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum AuditOutcome {
    /// The archive was processed.
    Audited(ArchiveAudit),

    /// The archive was skipped.
    Failed {
        /// Original archive file name.
        archive: String,
        /// Why it was skipped.
        reason: String,
    },
}

impl AuditOutcome {
    /// Returns whether the archive was skipped.
    #[must_use]
    pub const fn is_failed(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }

    /// Summary of an audited archive.
    #[must_use]
    pub const fn summary(&self) -> Option<&RepairSummary> {
        match self {
            Self::Audited(audit) => Some(&audit.summary),
            Self::Failed { .. } => None,
        }
    }
}

/// Result of auditing a directory.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AuditBatch {
    /// `_REPAIRED` archives written, in processing order.
    pub repaired: Vec<PathBuf>,

    /// Outcome per original archive file name.
    pub outcomes: BTreeMap<String, AuditOutcome>,
}

impl AuditBatch {
    /// Number of archives that were audited.
    #[must_use]
    pub fn audited_count(&self) -> usize {
        self.outcomes.values().filter(|o| !o.is_failed()).count()
    }

    /// Number of archives that were skipped.
    #[must_use]
    pub fn failed_count(&self) -> usize {
        self.outcomes.values().filter(|o| o.is_failed()).count()
    }

    /// Writes `audit_summary_all.json` into `dir` and returns its path.
    pub fn write_summary(&self, dir: &Path) -> Result<PathBuf> {
        std::fs::create_dir_all(dir)?;
        let path = dir.join(AGGREGATE_SUMMARY_NAME);
        write_json(&path, &self.outcomes)?;
        Ok(path)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn audited(name: &str) -> AuditOutcome {
        AuditOutcome::Audited(ArchiveAudit {
            summary: RepairSummary {
                archive: name.to_string(),
                score: ValidationScore::perfect(),
                unknown_permissions: Vec::new(),
                missing_files: Vec::new(),
                files: 3,
                repaired: false,
                diagnostics: Vec::new(),
            },
            repaired_path: None,
            signature: None,
        })
    }

    #[test]
    fn test_outcome_serialization_is_tagged() {
        let json = serde_json::to_value(audited("ext.zip")).unwrap();
        assert_eq!(json["status"], "audited");
        assert_eq!(json["summary"]["archive"], "ext.zip");
        assert_eq!(json["summary"]["score"]["total"], 100);
        assert!(json["summary"].get("diagnostics").is_none());

        let failed = AuditOutcome::Failed {
            archive: "broken.zip".to_string(),
            reason: "archive unreadable".to_string(),
        };
        let json = serde_json::to_value(&failed).unwrap();
        assert_eq!(json["status"], "failed");
        assert_eq!(json["reason"], "archive unreadable");
    }

    #[test]
    fn test_batch_counts_and_aggregate_file() {
        let temp = TempDir::new().unwrap();
        let mut batch = AuditBatch::default();
        batch.outcomes.insert("a.zip".to_string(), audited("a.zip"));
        batch.outcomes.insert(
            "b.camp".to_string(),
            AuditOutcome::Failed {
                archive: "b.camp".to_string(),
                reason: "boom".to_string(),
            },
        );

        assert_eq!(batch.audited_count(), 1);
        assert_eq!(batch.failed_count(), 1);

        let path = batch.write_summary(&temp.path().join("out")).unwrap();
        let json: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap();
        assert_eq!(json["a.zip"]["status"], "audited");
        assert_eq!(json["b.camp"]["status"], "failed");
    }
}

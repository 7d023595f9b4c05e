//! Heuristic integrity and risk score for one validation pass.

use std::fmt;

use serde::Deserialize;
use serde::Serialize;

/// Deducted from `total` when the manifest cannot be parsed.
pub const PARSE_FAILURE_PENALTY: i32 = 30;

/// Deducted from both `manifest_integrity` and `total` per defaulted key.
pub const MISSING_KEY_PENALTY: i32 = 10;

/// Deducted from `total` per permission outside the known set.
pub const UNKNOWN_PERMISSION_PENALTY: i32 = 5;

/// Deducted from `total` per referenced file absent from the capsule.
pub const MISSING_FILE_PENALTY: i32 = 5;

const PERFECT: i32 = 100;

/// Permission risk level. Only ever moves from `Low` to `Medium`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PermissionRisk {
    /// Every declared permission is known.
    #[default]
    Low,
    /// At least one declared permission is unknown.
    Medium,
}

impl fmt::Display for PermissionRisk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Low => write!(f, "low"),
            Self::Medium => write!(f, "medium"),
        }
    }
}

/// Score of a single validation pass.
///
/// Values start at 100 and only decrease. They are kept raw and may drop
/// below zero; use [`ValidationScore::display_total`] when presenting them.
///
/// # Examples
///
/// ```
/// use capaudit_core::PermissionRisk;
/// use capaudit_core::ValidationScore;
///
/// let mut score = ValidationScore::perfect();
/// score.record_unknown_permission();
/// assert_eq!(score.total(), 95);
/// assert_eq!(score.permission_risk(), PermissionRisk::Medium);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationScore {
    manifest_integrity: i32,
    permission_risk: PermissionRisk,
    total: i32,
}

impl Default for ValidationScore {
    fn default() -> Self {
        Self::perfect()
    }
}

impl ValidationScore {
    /// Returns the untouched starting score (100, low risk).
    #[must_use]
    pub const fn perfect() -> Self {
        Self {
            manifest_integrity: PERFECT,
            permission_risk: PermissionRisk::Low,
            total: PERFECT,
        }
    }

    /// Integrity component, raw.
    #[must_use]
    pub const fn manifest_integrity(&self) -> i32 {
        self.manifest_integrity
    }

    /// Permission risk level.
    #[must_use]
    pub const fn permission_risk(&self) -> PermissionRisk {
        self.permission_risk
    }

    /// Total score, raw and possibly negative.
    #[must_use]
    pub const fn total(&self) -> i32 {
        self.total
    }

    /// Total clamped at zero for reports.
    #[must_use]
    pub fn display_total(&self) -> u32 {
        self.total.max(0).unsigned_abs()
    }

    /// Integrity clamped at zero for reports.
    #[must_use]
    pub fn display_integrity(&self) -> u32 {
        self.manifest_integrity.max(0).unsigned_abs()
    }

    /// Marks the manifest as unparseable.
    pub fn record_parse_failure(&mut self) {
        self.manifest_integrity = 0;
        self.total = self.total.saturating_sub(PARSE_FAILURE_PENALTY);
    }

    /// Records one defaulted required key.
    pub fn record_missing_key(&mut self) {
        self.manifest_integrity = self.manifest_integrity.saturating_sub(MISSING_KEY_PENALTY);
        self.total = self.total.saturating_sub(MISSING_KEY_PENALTY);
    }

    /// Records one permission outside the known set.
    pub fn record_unknown_permission(&mut self) {
        self.permission_risk = PermissionRisk::Medium;
        self.total = self.total.saturating_sub(UNKNOWN_PERMISSION_PENALTY);
    }

    /// Records one referenced file that is absent.
    pub fn record_missing_file(&mut self) {
        self.total = self.total.saturating_sub(MISSING_FILE_PENALTY);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_perfect_score() {
        let score = ValidationScore::perfect();
        assert_eq!(score.total(), 100);
        assert_eq!(score.manifest_integrity(), 100);
        assert_eq!(score.permission_risk(), PermissionRisk::Low);
        assert_eq!(score, ValidationScore::default());
    }

    #[test]
    fn test_parse_failure() {
        let mut score = ValidationScore::perfect();
        score.record_parse_failure();
        assert_eq!(score.manifest_integrity(), 0);
        assert_eq!(score.total(), 70);
    }

    #[test]
    fn test_missing_keys_hit_both_components() {
        let mut score = ValidationScore::perfect();
        for _ in 0..3 {
            score.record_missing_key();
        }
        assert_eq!(score.manifest_integrity(), 70);
        assert_eq!(score.total(), 70);
    }

    #[test]
    fn test_risk_never_reverts() {
        let mut score = ValidationScore::perfect();
        score.record_unknown_permission();
        score.record_missing_file();
        score.record_missing_key();
        assert_eq!(score.permission_risk(), PermissionRisk::Medium);
    }

    #[test]
    fn test_total_goes_negative_but_displays_zero() {
        let mut score = ValidationScore::perfect();
        for _ in 0..25 {
            score.record_missing_file();
        }
        assert_eq!(score.total(), -25);
        assert_eq!(score.display_total(), 0);
        assert_eq!(score.display_integrity(), 100);
    }

    #[test]
    fn test_serialized_shape() {
        let mut score = ValidationScore::perfect();
        score.record_unknown_permission();
        let json = serde_json::to_value(score).unwrap_or_default();
        assert_eq!(json["manifest_integrity"], 100);
        assert_eq!(json["permission_risk"], "medium");
        assert_eq!(json["total"], 95);
    }
}

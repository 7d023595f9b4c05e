//! Human-readable output formatter with colors and styling.

use super::formatter::OutputFormatter;
use anyhow::Result;
use capaudit_core::AuditBatch;
use capaudit_core::AuditOutcome;
use capaudit_core::ManifestValidation;
use capaudit_core::PermissionRisk;
use capaudit_core::SignatureCheck;
use capaudit_core::ValidationScore;
use console::Term;
use console::style;
use std::path::Path;

pub struct HumanFormatter {
    verbose: bool,
    quiet: bool,
    use_colors: bool,
    term: Term,
}

impl HumanFormatter {
    pub fn new(verbose: bool, quiet: bool) -> Self {
        Self {
            verbose,
            quiet,
            use_colors: console::colors_enabled(),
            term: Term::stdout(),
        }
    }

    fn line(&self, text: &str) {
        let _ = self.term.write_line(text);
    }

    fn heading(&self, mark: &str, text: &str) {
        if self.use_colors {
            self.line(&format!("{} {text}", style(mark).green().bold()));
        } else {
            self.line(text);
        }
    }

    fn format_score(&self, score: &ValidationScore) -> String {
        let text = format!("{}/100", score.display_total());
        if !self.use_colors {
            return text;
        }
        match score.display_total() {
            90.. => style(text).green().to_string(),
            60..=89 => style(text).yellow().to_string(),
            _ => style(text).red().to_string(),
        }
    }

    fn format_risk(&self, risk: PermissionRisk) -> String {
        match (self.use_colors, risk) {
            (true, PermissionRisk::Medium) => style(risk).yellow().to_string(),
            _ => risk.to_string(),
        }
    }

    fn format_outcome(&self, name: &str, outcome: &AuditOutcome) {
        match outcome {
            AuditOutcome::Audited(audit) => {
                let summary = &audit.summary;
                self.line(&format!(
                    "  {name}: {} (risk: {}, {} files)",
                    self.format_score(&summary.score),
                    self.format_risk(summary.score.permission_risk()),
                    summary.files
                ));
                if !summary.unknown_permissions.is_empty() {
                    self.line(&format!(
                        "    Unknown permissions: {}",
                        summary.unknown_permissions.join(", ")
                    ));
                }
                if !summary.missing_files.is_empty() {
                    self.line(&format!(
                        "    Missing files: {}",
                        summary.missing_files.join(", ")
                    ));
                }
                if self.verbose {
                    if let Some(path) = &audit.repaired_path {
                        self.line(&format!("    Repaired: {}", path.display()));
                    }
                    if let Some(digest) = &audit.signature {
                        self.line(&format!("    SHA-256: {digest}"));
                    }
                    for note in &summary.diagnostics {
                        self.line(&format!("    Note: {note}"));
                    }
                }
            }
            AuditOutcome::Failed { reason, .. } => {
                let label = if self.use_colors {
                    style("FAILED").red().bold().to_string()
                } else {
                    "FAILED".to_string()
                };
                self.line(&format!("  {name}: {label} {reason}"));
            }
        }
    }
}

impl OutputFormatter for HumanFormatter {
    fn format_audit_result(
        &self,
        batch: &AuditBatch,
        dry_run: bool,
        aggregate: Option<&Path>,
    ) -> Result<()> {
        if self.quiet {
            return Ok(());
        }

        if batch.outcomes.is_empty() {
            self.line("No capsule archives found");
            return Ok(());
        }

        let title = if dry_run {
            "Audit complete (dry run, nothing written)"
        } else {
            "Audit complete"
        };
        self.heading("✓", title);

        for (name, outcome) in &batch.outcomes {
            self.format_outcome(name, outcome);
        }

        self.line("");
        self.line(&format!(
            "  Audited: {}  Failed: {}  Repaired archives: {}",
            batch.audited_count(),
            batch.failed_count(),
            batch.repaired.len()
        ));
        if let Some(path) = aggregate {
            self.line(&format!("  Summary: {}", path.display()));
        }

        Ok(())
    }

    fn format_validation_result(
        &self,
        manifest: &Path,
        validation: &ManifestValidation,
        log: &[String],
    ) -> Result<()> {
        if self.quiet {
            return Ok(());
        }

        self.heading("✓", &format!("Validated {}", manifest.display()));
        self.line(&format!(
            "  Score: {}  Integrity: {}  Risk: {}",
            self.format_score(&validation.score),
            validation.score.display_integrity(),
            self.format_risk(validation.score.permission_risk())
        ));
        if let Some(reason) = &validation.parse_error {
            self.line(&format!("  Parse error: {reason}"));
        }
        if !validation.filled_keys.is_empty() {
            self.line(&format!("  Defaulted keys: {}", validation.filled_keys.join(", ")));
        }
        if !validation.unknown_permissions.is_empty() {
            self.line(&format!(
                "  Unknown permissions: {}",
                validation.unknown_permissions.join(", ")
            ));
        }
        if !validation.missing_files.is_empty() {
            self.line(&format!(
                "  Missing files: {}",
                validation.missing_files.join(", ")
            ));
        }

        if self.verbose {
            self.line("");
            for entry in log {
                self.line(&format!("  {entry}"));
            }
        }

        if let Some(corrected) = validation.to_json_pretty()? {
            self.line("");
            self.line("Corrected manifest:");
            self.line(&corrected);
        }

        Ok(())
    }

    fn format_signature_check(&self, check: &SignatureCheck) -> Result<()> {
        if self.quiet {
            return Ok(());
        }

        if check.matches() {
            self.heading("✓", &format!("Signature OK: {}", check.archive.display()));
        } else if self.use_colors {
            self.line(&format!(
                "{} {}",
                style("Signature MISMATCH:").red().bold(),
                check.archive.display()
            ));
        } else {
            self.line(&format!("Signature MISMATCH: {}", check.archive.display()));
        }
        self.line(&format!("  Expected: {}", check.expected));
        self.line(&format!("  Computed: {}", check.actual));

        Ok(())
    }

    fn format_warning(&self, message: &str) {
        if self.quiet {
            return;
        }

        if self.use_colors {
            self.line(&format!("{} {message}", style("⚠").yellow().bold()));
        } else {
            self.line(&format!("WARNING: {message}"));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plain() -> HumanFormatter {
        HumanFormatter {
            verbose: false,
            quiet: false,
            use_colors: false,
            term: Term::stdout(),
        }
    }

    #[test]
    fn test_score_is_clamped_for_display() {
        let mut score = ValidationScore::perfect();
        for _ in 0..25 {
            score.record_unknown_permission();
        }
        assert_eq!(score.total(), -25);
        assert_eq!(plain().format_score(&score), "0/100");
    }

    #[test]
    fn test_plain_risk_label() {
        assert_eq!(plain().format_risk(PermissionRisk::Medium), "medium");
        assert_eq!(plain().format_risk(PermissionRisk::Low), "low");
    }
}

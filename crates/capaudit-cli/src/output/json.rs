//! JSON output formatter for machine-readable results.

use super::formatter::JsonOutput;
use super::formatter::OutputFormatter;
use anyhow::Result;
use capaudit_core::AuditBatch;
use capaudit_core::AuditOutcome;
use capaudit_core::ManifestValidation;
use capaudit_core::SignatureCheck;
use capaudit_core::ValidationScore;
use serde::Serialize;
use serde_json::Map;
use serde_json::Value;
use std::collections::BTreeMap;
use std::io::Write;
use std::io::{self};
use std::path::Path;

pub struct JsonFormatter;

impl JsonFormatter {
    fn output<T: Serialize>(value: &T) -> Result<()> {
        let json = serde_json::to_string_pretty(value)?;
        writeln!(io::stdout(), "{json}")?;
        Ok(())
    }
}

impl OutputFormatter for JsonFormatter {
    fn format_audit_result(
        &self,
        batch: &AuditBatch,
        dry_run: bool,
        aggregate: Option<&Path>,
    ) -> Result<()> {
        #[derive(Serialize)]
        struct AuditOutput<'a> {
            dry_run: bool,
            audited: usize,
            failed: usize,
            repaired: Vec<String>,
            #[serde(skip_serializing_if = "Option::is_none")]
            aggregate_summary: Option<String>,
            outcomes: &'a BTreeMap<String, AuditOutcome>,
        }

        let data = AuditOutput {
            dry_run,
            audited: batch.audited_count(),
            failed: batch.failed_count(),
            repaired: batch
                .repaired
                .iter()
                .map(|p| p.display().to_string())
                .collect(),
            aggregate_summary: aggregate.map(|p| p.display().to_string()),
            outcomes: &batch.outcomes,
        };

        Self::output(&JsonOutput::success("audit", data))
    }

    fn format_validation_result(
        &self,
        manifest: &Path,
        validation: &ManifestValidation,
        log: &[String],
    ) -> Result<()> {
        #[derive(Serialize)]
        struct ValidationOutput<'a> {
            manifest: String,
            score: ValidationScore,
            unknown_permissions: &'a [String],
            filled_keys: &'a [String],
            missing_files: &'a [String],
            corrected: Option<&'a Map<String, Value>>,
            log: &'a [String],
        }

        let data = ValidationOutput {
            manifest: manifest.display().to_string(),
            score: validation.score,
            unknown_permissions: &validation.unknown_permissions,
            filled_keys: &validation.filled_keys,
            missing_files: &validation.missing_files,
            corrected: validation.manifest.as_ref(),
            log,
        };

        let output = match &validation.parse_error {
            Some(reason) => JsonOutput::failure("validate", data, reason.clone()),
            None => JsonOutput::success("validate", data),
        };
        Self::output(&output)
    }

    fn format_signature_check(&self, check: &SignatureCheck) -> Result<()> {
        #[derive(Serialize)]
        struct VerifyOutput<'a> {
            #[serde(flatten)]
            check: &'a SignatureCheck,
            matches: bool,
        }

        let data = VerifyOutput {
            check,
            matches: check.matches(),
        };
        let output = if check.matches() {
            JsonOutput::success("verify", data)
        } else {
            JsonOutput::failure("verify", data, "signature mismatch")
        };
        Self::output(&output)
    }

    fn format_warning(&self, message: &str) {
        #[derive(Serialize)]
        struct WarningData {
            message: String,
        }

        let output = JsonOutput::success(
            "warning",
            WarningData {
                message: message.to_string(),
            },
        );
        let _ = Self::output(&output);
    }
}

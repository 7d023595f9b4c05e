//! Output formatter trait for CLI results.

use anyhow::Result;
use capaudit_core::AuditBatch;
use capaudit_core::ManifestValidation;
use capaudit_core::SignatureCheck;
use serde::Serialize;
use std::path::Path;

/// Common output formatter trait
pub trait OutputFormatter {
    /// Format the result of a directory audit
    fn format_audit_result(
        &self,
        batch: &AuditBatch,
        dry_run: bool,
        aggregate: Option<&Path>,
    ) -> Result<()>;

    /// Format the result of validating a single manifest
    fn format_validation_result(
        &self,
        manifest: &Path,
        validation: &ManifestValidation,
        log: &[String],
    ) -> Result<()>;

    /// Format a signature check
    fn format_signature_check(&self, check: &SignatureCheck) -> Result<()>;

    /// Format warning message
    fn format_warning(&self, message: &str);
}

/// Generic JSON output structure
#[derive(Debug, Serialize)]
pub struct JsonOutput<T> {
    pub operation: String,
    pub status: Status,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Success,
    Error,
}

impl<T: Serialize> JsonOutput<T> {
    pub fn success(operation: impl Into<String>, data: T) -> Self {
        Self {
            operation: operation.into(),
            status: Status::Success,
            data: Some(data),
            error: None,
        }
    }

    /// An error envelope that still carries its data.
    pub fn failure(operation: impl Into<String>, data: T, error: impl Into<String>) -> Self {
        Self {
            operation: operation.into(),
            status: Status::Error,
            data: Some(data),
            error: Some(error.into()),
        }
    }
}

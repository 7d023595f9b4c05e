//! Error conversion utilities for CLI.
//!
//! Converts capaudit-core's typed errors (thiserror) into user-friendly
//! contextual errors (anyhow) with actionable guidance.

use anyhow::anyhow;
use capaudit_core::AuditError;
use std::path::Path;

/// Converts `AuditError` to a user-friendly anyhow error with context.
pub fn convert_audit_error(err: AuditError, subject: &Path) -> anyhow::Error {
    match err {
        AuditError::ArchiveUnreadable { path, reason } => {
            anyhow!(
                "Archive '{}' could not be read: {}\n\
                 HINT: The archive may be corrupted or not a zip container.",
                path.display(),
                reason
            )
        }
        AuditError::SignatureMismatch { expected, actual } => {
            anyhow!(
                "Signature mismatch for '{}'\n\
                 Expected: {expected}\n\
                 Computed: {actual}\n\
                 HINT: The archive changed after it was signed. Re-run the audit on the original.",
                subject.display()
            )
        }
        AuditError::MissingSignature { path } => {
            anyhow!(
                "No usable signature for '{}': expected sidecar '{}'\n\
                 HINT: Only archives written by `capaudit audit` carry a .sig sidecar.",
                subject.display(),
                path.display()
            )
        }
        AuditError::InvalidConfig(reason) => {
            anyhow!(
                "Invalid configuration: {reason}\n\
                 HINT: Check the policy file and command-line options."
            )
        }
        AuditError::Io(io_err) => {
            anyhow!(
                "I/O error while processing '{}': {}",
                subject.display(),
                io_err
            )
        }
        _ => anyhow::Error::from(err).context(format!("Error processing '{}'", subject.display())),
    }
}

/// Adds context to a core result about the file being processed.
pub fn add_audit_context<T>(
    result: Result<T, AuditError>,
    subject: &Path,
) -> anyhow::Result<T> {
    result.map_err(|e| convert_audit_error(e, subject))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;
    use std::path::PathBuf;

    #[test]
    fn test_convert_signature_mismatch() {
        let err = AuditError::SignatureMismatch {
            expected: "aa".into(),
            actual: "bb".into(),
        };
        let msg = format!("{:?}", convert_audit_error(err, Path::new("ext_REPAIRED.zip")));
        assert!(msg.contains("Signature mismatch"));
        assert!(msg.contains("ext_REPAIRED.zip"));
        assert!(msg.contains("HINT"));
    }

    #[test]
    fn test_convert_missing_signature() {
        let err = AuditError::MissingSignature {
            path: PathBuf::from("ext.zip.sig"),
        };
        let msg = format!("{:?}", convert_audit_error(err, Path::new("ext.zip")));
        assert!(msg.contains("ext.zip.sig"));
        assert!(msg.contains("HINT"));
    }

    #[test]
    fn test_convert_io_error() {
        let err = AuditError::Io(io::Error::new(io::ErrorKind::NotFound, "file not found"));
        let msg = format!("{:?}", convert_audit_error(err, Path::new("capsules")));
        assert!(msg.contains("I/O error"));
        assert!(msg.contains("capsules"));
    }

    #[test]
    fn test_other_errors_keep_source() {
        let err = AuditError::Serialization("yaml: bad indent".into());
        let msg = format!("{:?}", convert_audit_error(err, Path::new("policy.yaml")));
        assert!(msg.contains("policy.yaml"));
        assert!(msg.contains("bad indent"));
    }
}

//! Error types for capsule audit operations.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using `AuditError`.
pub type Result<T> = std::result::Result<T, AuditError>;

/// Errors that can occur while auditing capsule archives.
///
/// Manifest parse failures, unknown permissions and missing referenced files
/// are scored by the validator rather than raised. Only the variants below
/// ever cross a function boundary.
#[derive(Error, Debug)]
pub enum AuditError {
    /// I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Archive is corrupt, inaccessible or not a zip container.
    #[error("archive unreadable: {path}: {reason}")]
    ArchiveUnreadable {
        /// The archive that could not be read.
        path: PathBuf,
        /// Underlying reason.
        reason: String,
    },

    /// Manifest is not a well-formed JSON object.
    #[error("manifest parse error: {0}")]
    ManifestParse(String),

    /// A document could not be serialized or deserialized.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Signature sidecar does not match the archive bytes.
    #[error("signature mismatch: expected {expected}, computed {actual}")]
    SignatureMismatch {
        /// Digest recorded in the sidecar.
        expected: String,
        /// Digest computed from the archive.
        actual: String,
    },

    /// Signature sidecar is absent or malformed.
    #[error("missing or malformed signature sidecar: {path}")]
    MissingSignature {
        /// Expected sidecar path.
        path: PathBuf,
    },

    /// Configuration or policy is invalid.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl AuditError {
    /// Returns `true` if this error only affects the archive being processed.
    ///
    /// The batch loop records such errors as a failed outcome and moves on to
    /// the next archive.
    ///
    /// # Examples
    ///
    /// ```
    /// use capaudit_core::AuditError;
    /// use std::path::PathBuf;
    ///
    /// let err = AuditError::ArchiveUnreadable {
    ///     path: PathBuf::from("broken.zip"),
    ///     reason: "invalid Zip archive".to_string(),
    /// };
    /// assert!(err.is_archive_local());
    ///
    /// let err = AuditError::InvalidConfig("empty suffix list".to_string());
    /// assert!(!err.is_archive_local());
    /// ```
    #[must_use]
    pub const fn is_archive_local(&self) -> bool {
        matches!(
            self,
            Self::Io(_)
                | Self::ArchiveUnreadable { .. }
                | Self::ManifestParse(_)
                | Self::Serialization(_)
        )
    }

    /// Returns a context string for this error, if available.
    #[must_use]
    pub fn context(&self) -> Option<&str> {
        match self {
            Self::ArchiveUnreadable { reason, .. } => Some(reason),
            Self::ManifestParse(msg) | Self::Serialization(msg) | Self::InvalidConfig(msg) => {
                Some(msg)
            }
            _ => None,
        }
    }
}

impl From<zip::result::ZipError> for AuditError {
    fn from(err: zip::result::ZipError) -> Self {
        match err {
            zip::result::ZipError::Io(io) => Self::Io(io),
            other => Self::Serialization(format!("zip: {other}")),
        }
    }
}

impl From<serde_json::Error> for AuditError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(format!("json: {err}"))
    }
}

impl From<serde_yaml::Error> for AuditError {
    fn from(err: serde_yaml::Error) -> Self {
        Self::Serialization(format!("yaml: {err}"))
    }
}

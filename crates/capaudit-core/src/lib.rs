//! Capsule archive auditing library.
//!
//! `capaudit-core` opens capsule archives (`.zip` / `.camp`), validates and
//! repairs their `manifest.json`, regenerates capsule metadata, and writes
//! a signed `_REPAIRED` copy of each archive together with an audit trail.
//!
//! # Examples
//!
//! ```no_run
//! use capaudit_core::AuditConfig;
//! use capaudit_core::Auditor;
//! use std::path::Path;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let auditor = Auditor::new(AuditConfig::default())?;
//! let batch = auditor.audit_directory(Path::new("capsules"), false)?;
//! println!("Repaired {} archives", batch.repaired.len());
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod archive;
pub mod audit;
pub mod config;
pub mod error;
pub mod manifest;
pub mod repair_log;
pub mod report;

#[cfg(any(test, feature = "test-utils"))]
#[doc(hidden)]
pub mod test_utils;

// Re-export main API types
pub use archive::SignatureCheck;
pub use archive::SignatureRecord;
pub use archive::verify_signature;
pub use audit::Advisor;
pub use audit::AgentAssist;
pub use audit::ArchiveAudit;
pub use audit::AssistRequest;
pub use audit::AuditBatch;
pub use audit::AuditOutcome;
pub use audit::Auditor;
pub use audit::RepairSummary;
pub use config::AuditConfig;
pub use config::ValidatorPolicy;
pub use error::AuditError;
pub use error::Result;
pub use manifest::ManifestValidation;
pub use manifest::ManifestValidator;
pub use manifest::PermissionRisk;
pub use manifest::ValidationScore;
pub use repair_log::RepairLog;
pub use report::AuditProgress;
pub use report::ExtractionReport;
pub use report::NoopProgress;

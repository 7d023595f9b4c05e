//! Capsule manifest validation.
//!
//! # Examples
//!
//! ```no_run
//! use capaudit_core::ManifestValidator;
//! use capaudit_core::RepairLog;
//! use capaudit_core::ValidatorPolicy;
//! use std::path::Path;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let validator = ManifestValidator::new(ValidatorPolicy::default());
//! let mut log = RepairLog::in_memory();
//! let root = Path::new("extracted_ext");
//! let result = validator.repair_file(&root.join("manifest.json"), root, true, &mut log)?;
//! println!("score {}/100", result.score.display_total());
//! # Ok(())
//! # }
//! ```

pub mod score;
pub mod validator;

pub use score::PermissionRisk;
pub use score::ValidationScore;
pub use validator::MANIFEST_NAME;
pub use validator::ManifestValidation;
pub use validator::ManifestValidator;

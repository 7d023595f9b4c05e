//! Validate command implementation.

use crate::cli::ValidateArgs;
use crate::error::add_audit_context;
use crate::output::OutputFormatter;
use anyhow::Result;
use capaudit_core::ManifestValidator;
use capaudit_core::RepairLog;
use capaudit_core::ValidatorPolicy;
use std::path::Path;
use std::path::PathBuf;

pub fn execute(args: &ValidateArgs, formatter: &dyn OutputFormatter) -> Result<()> {
    let policy = match &args.policy {
        Some(path) => add_audit_context(ValidatorPolicy::from_yaml_file(path), path)?,
        None => ValidatorPolicy::default(),
    };

    let root = args.root.clone().unwrap_or_else(|| manifest_dir(&args.manifest));

    let validator = ManifestValidator::new(policy);
    let mut log = RepairLog::in_memory();
    let validation = add_audit_context(
        validator.repair_file(&args.manifest, &root, true, &mut log),
        &args.manifest,
    )?;

    formatter.format_validation_result(&args.manifest, &validation, log.lines())
}

fn manifest_dir(manifest: &Path) -> PathBuf {
    match manifest.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manifest_dir() {
        assert_eq!(manifest_dir(Path::new("manifest.json")), PathBuf::from("."));
        assert_eq!(
            manifest_dir(Path::new("ext/manifest.json")),
            PathBuf::from("ext")
        );
    }
}

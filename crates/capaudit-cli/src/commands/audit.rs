//! Audit command implementation.

use crate::advisor::HttpAdvisor;
use crate::cli::AuditArgs;
use crate::error::add_audit_context;
use crate::output::OutputFormatter;
use crate::progress::CliProgress;
use anyhow::Context;
use anyhow::Result;
use capaudit_core::AuditConfig;
use capaudit_core::Auditor;
use capaudit_core::NoopProgress;
use capaudit_core::ValidatorPolicy;
use std::env;
use std::time::Duration;

/// Output directory used when `--output-dir` is not given, inside the base
/// directory.
const DEFAULT_OUTPUT_DIR: &str = "audited_capsules";

pub fn execute(
    args: &AuditArgs,
    formatter: &dyn OutputFormatter,
    hide_progress: bool,
) -> Result<()> {
    let base_dir = match &args.base_dir {
        Some(dir) => dir.clone(),
        None => env::current_dir().context("failed to get current directory")?,
    };
    let output_dir = args
        .output_dir
        .clone()
        .unwrap_or_else(|| base_dir.join(DEFAULT_OUTPUT_DIR));

    let mut config = AuditConfig::default()
        .with_output_dir(&output_dir)
        .with_backup_dir(args.backup_dir.clone());
    if let Some(level) = args.compression_level {
        config = config.with_compression_level(Some(level));
    }
    if let Some(path) = &args.policy {
        let policy = add_audit_context(ValidatorPolicy::from_yaml_file(path), path)?;
        config = config.with_policy(policy);
    }

    let mut auditor = add_audit_context(Auditor::new(config), &base_dir)?;
    if args.assist {
        let advisor = HttpAdvisor::new(Duration::from_secs(args.assist_timeout))
            .context("failed to build the assistant HTTP client")?;
        auditor = auditor.with_advisor(Box::new(advisor));
    }

    let dry_run = args.audit_only;

    // Use progress bar if TTY is detected (not quiet, not JSON, is terminal)
    let batch = if !hide_progress && CliProgress::should_show() {
        let mut progress = CliProgress::new("Auditing");
        add_audit_context(
            auditor.audit_directory_with_progress(&base_dir, dry_run, &mut progress),
            &base_dir,
        )?
    } else {
        let mut noop = NoopProgress;
        add_audit_context(
            auditor.audit_directory_with_progress(&base_dir, dry_run, &mut noop),
            &base_dir,
        )?
    };

    let aggregate = if dry_run || batch.outcomes.is_empty() {
        None
    } else {
        Some(add_audit_context(batch.write_summary(&output_dir), &output_dir)?)
    };

    formatter.format_audit_result(&batch, dry_run, aggregate.as_deref())?;

    if batch.failed_count() > 0 {
        formatter.format_warning(&format!(
            "{} archive(s) could not be audited",
            batch.failed_count()
        ));
    }

    // Individual archive failures are reported, not turned into an exit code.
    Ok(())
}

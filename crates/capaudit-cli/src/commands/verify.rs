//! Verify command implementation

use crate::cli::VerifyArgs;
use crate::error::add_audit_context;
use crate::output::OutputFormatter;
use anyhow::Result;
use capaudit_core::verify_signature;

pub fn execute(args: &VerifyArgs, formatter: &dyn OutputFormatter) -> Result<()> {
    let check = add_audit_context(verify_signature(&args.archive), &args.archive)?;

    formatter.format_signature_check(&check)?;

    // Exit non-zero on mismatch
    add_audit_context(check.into_result(), &args.archive)?;
    Ok(())
}

//! CLI argument parsing using clap.

use clap::Parser;
use clap::Subcommand;
use clap_complete::Shell;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "capaudit")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress non-error output
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Output results in JSON format
    #[arg(short, long, global = true)]
    pub json: bool,

    /// Log level for diagnostics on stderr (trace, debug, info, warn, error).
    /// `RUST_LOG` takes precedence when set.
    #[arg(long, global = true, default_value = "warn")]
    pub log_level: String,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Audit, repair and sign every capsule archive in a directory
    Audit(AuditArgs),
    /// Validate a single manifest file without writing anything
    Validate(ValidateArgs),
    /// Check a repaired archive against its .sig sidecar
    Verify(VerifyArgs),
    /// Generate shell completions
    Completion {
        /// Target shell
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(clap::Args)]
pub struct AuditArgs {
    /// Directory containing .zip / .camp capsules (default: current directory)
    #[arg(value_name = "BASE_DIR")]
    pub base_dir: Option<PathBuf>,

    /// Score and log only; write no repaired archives
    #[arg(long)]
    pub audit_only: bool,

    /// Directory receiving repaired archives (default: BASE_DIR/audited_capsules)
    #[arg(short, long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// YAML file overriding the manifest validation policy
    #[arg(long, value_name = "FILE")]
    pub policy: Option<PathBuf>,

    /// Copy each original archive here before processing it
    #[arg(long, value_name = "DIR")]
    pub backup_dir: Option<PathBuf>,

    /// Deflate level for repaired archives (0 stores entries uncompressed)
    #[arg(short = 'l', long, value_parser = clap::value_parser!(u8).range(0..=9))]
    pub compression_level: Option<u8>,

    /// Consult the assistant endpoint named in agent_assist.yaml
    #[arg(long)]
    pub assist: bool,

    /// Timeout for assistant requests, in seconds
    #[arg(long, default_value = "10", requires = "assist")]
    pub assist_timeout: u64,
}

#[derive(clap::Args)]
pub struct ValidateArgs {
    /// Path to the manifest.json file
    #[arg(value_name = "MANIFEST")]
    pub manifest: PathBuf,

    /// Root that referenced scripts are resolved against (default: the
    /// manifest's directory)
    #[arg(long, value_name = "DIR")]
    pub root: Option<PathBuf>,

    /// YAML file overriding the manifest validation policy
    #[arg(long, value_name = "FILE")]
    pub policy: Option<PathBuf>,
}

#[derive(clap::Args)]
pub struct VerifyArgs {
    /// Path to the repaired archive
    #[arg(value_name = "ARCHIVE")]
    pub archive: PathBuf,
}

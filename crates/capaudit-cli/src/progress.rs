//! Progress bar implementation for directory audits.

use capaudit_core::AuditOutcome;
use capaudit_core::AuditProgress;
use console::Term;
use indicatif::ProgressBar;
use indicatif::ProgressStyle;
use std::path::Path;

/// CLI progress bar wrapper implementing `AuditProgress`.
///
/// Shows one tick per archive with the name of the archive being audited.
/// Cleans up on drop.
pub struct CliProgress {
    bar: ProgressBar,
}

impl CliProgress {
    /// Creates a new CLI progress bar. The length is set once the batch
    /// knows how many archives it selected.
    #[must_use]
    pub fn new(message: &str) -> Self {
        let bar = ProgressBar::new(0);

        // Template: "Auditing [████████░░░░] 3/8 capsules ext.zip"
        bar.set_style(
            ProgressStyle::default_bar()
                .template("{prefix} [{bar:40.cyan/blue}] {pos}/{len} capsules {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("█▓░"),
        );
        bar.set_prefix(message.to_string());

        Self { bar }
    }

    /// Checks if we should show progress (TTY detection).
    #[must_use]
    pub fn should_show() -> bool {
        Term::stdout().is_term()
    }
}

impl Drop for CliProgress {
    fn drop(&mut self) {
        self.bar.finish_and_clear();
    }
}

impl AuditProgress for CliProgress {
    fn on_archive_start(&mut self, path: &Path, total: usize, _current: usize) {
        self.bar.set_length(total as u64);
        let name = path
            .file_name()
            .map_or_else(|| path.display().to_string(), |n| n.to_string_lossy().into_owned());
        self.bar.set_message(name);
    }

    fn on_archive_complete(&mut self, archive: &str, outcome: &AuditOutcome) {
        if outcome.is_failed() {
            self.bar.println(format!("skipped {archive}"));
        }
        self.bar.inc(1);
    }

    fn on_complete(&mut self) {
        self.bar.finish_and_clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_callback() {
        let mut progress = CliProgress::new("Testing");

        progress.on_archive_start(Path::new("a.zip"), 2, 1);
        progress.on_archive_complete(
            "a.zip",
            &AuditOutcome::Failed {
                archive: "a.zip".to_string(),
                reason: "broken".to_string(),
            },
        );

        assert_eq!(progress.bar.position(), 1);
        assert_eq!(progress.bar.length(), Some(2));
    }
}

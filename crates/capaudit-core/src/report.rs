//! Extraction statistics and batch progress reporting.

use std::path::Path;

use crate::audit::AuditOutcome;

/// Report of one capsule extraction.
#[derive(Debug, Clone, Default)]
pub struct ExtractionReport {
    /// Number of files written to the scratch tree.
    pub files_extracted: usize,

    /// Number of directories created.
    pub directories_created: usize,

    /// Total bytes written to disk.
    pub bytes_written: u64,

    /// Entries that were not extracted, with the reason.
    pub skipped: Vec<String>,
}

impl ExtractionReport {
    /// Creates a new empty extraction report.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records an entry that was not extracted.
    pub fn add_skipped(&mut self, message: String) {
        self.skipped.push(message);
    }

    /// Returns whether any entry was skipped.
    #[must_use]
    pub fn has_skipped(&self) -> bool {
        !self.skipped.is_empty()
    }
}

/// Callback trait for progress reporting during a directory audit.
///
/// # Examples
///
/// ```
/// use capaudit_core::AuditOutcome;
/// use capaudit_core::AuditProgress;
/// use std::path::Path;
///
/// struct Printer;
///
/// impl AuditProgress for Printer {
///     fn on_archive_start(&mut self, path: &Path, total: usize, current: usize) {
///         println!("[{current}/{total}] {}", path.display());
///     }
///
///     fn on_archive_complete(&mut self, name: &str, outcome: &AuditOutcome) {
///         println!("{name}: {}", if outcome.is_failed() { "failed" } else { "ok" });
///     }
///
///     fn on_complete(&mut self) {}
/// }
/// ```
pub trait AuditProgress {
    /// Called before an archive is processed.
    ///
    /// # Arguments
    ///
    /// * `path` - Archive being processed
    /// * `total` - Number of archives selected
    /// * `current` - Current archive number (1-indexed)
    fn on_archive_start(&mut self, path: &Path, total: usize, current: usize);

    /// Called once an archive has an outcome.
    fn on_archive_complete(&mut self, name: &str, outcome: &AuditOutcome);

    /// Called when the whole batch is done.
    fn on_complete(&mut self);
}

/// No-op implementation of `AuditProgress`.
#[derive(Debug, Default)]
pub struct NoopProgress;

impl AuditProgress for NoopProgress {
    fn on_archive_start(&mut self, _path: &Path, _total: usize, _current: usize) {}

    fn on_archive_complete(&mut self, _name: &str, _outcome: &AuditOutcome) {}

    fn on_complete(&mut self) {}
}

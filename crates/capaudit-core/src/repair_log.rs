//! Append-only, human-readable audit trail (`repair.log`).

use std::fs::File;
use std::io::BufWriter;
use std::io::Write;
use std::path::Path;

use crate::Result;

/// File name of the per-archive audit trail.
pub const REPAIR_LOG_NAME: &str = "repair.log";

/// Append-only audit trail, one line per repair action.
///
/// Lines are kept in memory and, when backed by a file, written through
/// immediately. A write failure does not interrupt the audit; the first one
/// is kept and returned by [`RepairLog::finish`].
///
/// # Examples
///
/// ```
/// use capaudit_core::RepairLog;
///
/// let mut log = RepairLog::in_memory();
/// log.record("Missing key 'name' filled.");
/// assert_eq!(log.lines(), ["Missing key 'name' filled."]);
/// ```
pub struct RepairLog {
    lines: Vec<String>,
    sink: Option<BufWriter<File>>,
    deferred_error: Option<std::io::Error>,
}

impl RepairLog {
    /// Creates a log that is only kept in memory.
    #[must_use]
    pub fn in_memory() -> Self {
        Self {
            lines: Vec::new(),
            sink: None,
            deferred_error: None,
        }
    }

    /// Creates (truncating) a log file at `path`.
    pub fn create(path: &Path) -> Result<Self> {
        let file = File::create(path)?;
        Ok(Self {
            lines: Vec::new(),
            sink: Some(BufWriter::new(file)),
            deferred_error: None,
        })
    }

    /// Appends one line.
    pub fn record(&mut self, line: impl Into<String>) {
        let line = line.into();
        tracing::debug!(target: "capaudit::repair_log", "{line}");
        if let Some(sink) = self.sink.as_mut()
            && self.deferred_error.is_none()
            && let Err(e) = writeln!(sink, "{line}")
        {
            self.deferred_error = Some(e);
        }
        self.lines.push(line);
    }

    /// Lines recorded so far.
    #[must_use]
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// Returns whether any recorded line contains `needle`.
    #[must_use]
    pub fn contains(&self, needle: &str) -> bool {
        self.lines.iter().any(|line| line.contains(needle))
    }

    /// Flushes the file, if any, and returns the recorded lines.
    ///
    /// # Errors
    ///
    /// Returns the first write error seen while recording, or the flush
    /// error.
    pub fn finish(mut self) -> Result<Vec<String>> {
        if let Some(e) = self.deferred_error.take() {
            return Err(e.into());
        }
        if let Some(mut sink) = self.sink.take() {
            sink.flush()?;
            sink.get_ref().sync_all()?;
        }
        Ok(self.lines)
    }
}

impl std::fmt::Debug for RepairLog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RepairLog")
            .field("lines", &self.lines.len())
            .field("file_backed", &self.sink.is_some())
            .finish()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_in_memory_log() {
        let mut log = RepairLog::in_memory();
        log.record("first");
        log.record(String::from("second"));
        assert!(log.contains("sec"));
        assert_eq!(log.finish().unwrap(), vec!["first", "second"]);
    }

    #[test]
    fn test_file_backed_log_writes_lines() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join(REPAIR_LOG_NAME);

        let mut log = RepairLog::create(&path).unwrap();
        log.record("Capsule Repair Summary:");
        log.record("Score: 65/100");
        log.finish().unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content, "Capsule Repair Summary:\nScore: 65/100\n");
    }

    #[test]
    fn test_create_truncates_previous_content() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join(REPAIR_LOG_NAME);
        std::fs::write(&path, "stale\n").unwrap();

        let log = RepairLog::create(&path).unwrap();
        log.finish().unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "");
    }
}

//! Zip extraction into a scratch directory.

use std::fs::File;
use std::fs::create_dir_all;
use std::io::BufWriter;
use std::path::Path;

use zip::ZipArchive;

use crate::AuditError;
use crate::ExtractionReport;
use crate::Result;

/// Extracts every safe entry of the zip container at `archive` into `dest`.
///
/// Entries whose names are absolute or climb out of `dest` are skipped, as
/// are symlink entries; each skip is listed in the report.
///
/// # Errors
///
/// Returns `AuditError::ArchiveUnreadable` if the container or one of its
/// entries cannot be decoded, and `AuditError::Io` for filesystem failures.
pub fn extract_zip(archive: &Path, dest: &Path) -> Result<ExtractionReport> {
    let unreadable = |reason: String| AuditError::ArchiveUnreadable {
        path: archive.to_path_buf(),
        reason,
    };

    let file = File::open(archive).map_err(|e| unreadable(e.to_string()))?;
    let mut zip = ZipArchive::new(file).map_err(|e| unreadable(e.to_string()))?;
    let mut report = ExtractionReport::new();

    for index in 0..zip.len() {
        let mut entry = zip
            .by_index(index)
            .map_err(|e| unreadable(format!("entry #{index}: {e}")))?;
        let raw_name = entry.name().to_string();

        let Some(relative) = entry.enclosed_name() else {
            report.add_skipped(format!("unsafe entry name: {raw_name}"));
            continue;
        };
        if entry.is_symlink() {
            report.add_skipped(format!("symlink entry: {raw_name}"));
            continue;
        }

        let output_path = dest.join(&relative);
        if entry.is_dir() {
            create_dir_all(&output_path)?;
            report.directories_created += 1;
            continue;
        }

        if let Some(parent) = output_path.parent() {
            create_dir_all(parent)?;
        }
        let mut writer = BufWriter::new(File::create(&output_path)?);
        let written = std::io::copy(&mut entry, &mut writer)
            .map_err(|e| unreadable(format!("{raw_name}: {e}")))?;
        writer.into_inner().map_err(|e| e.into_error())?;

        report.files_extracted += 1;
        report.bytes_written += written;
    }

    Ok(report)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::test_utils::create_test_zip;
    use tempfile::TempDir;

    #[test]
    fn test_extract_nested_entries() {
        let temp = TempDir::new().unwrap();
        let archive = temp.path().join("ext.zip");
        std::fs::write(
            &archive,
            create_test_zip(&[
                ("manifest.json", b"{}"),
                ("src/deep/content.js", b"console.log(1);"),
            ]),
        )
        .unwrap();

        let dest = temp.path().join("out");
        std::fs::create_dir(&dest).unwrap();
        let report = extract_zip(&archive, &dest).unwrap();

        assert_eq!(report.files_extracted, 2);
        assert_eq!(report.bytes_written, 17);
        assert_eq!(
            std::fs::read_to_string(dest.join("src/deep/content.js")).unwrap(),
            "console.log(1);"
        );
    }

    #[test]
    fn test_traversal_entry_skipped() {
        let temp = TempDir::new().unwrap();
        let archive = temp.path().join("evil.zip");
        std::fs::write(
            &archive,
            create_test_zip(&[("../escape.js", b"x"), ("ok.js", b"y")]),
        )
        .unwrap();

        let dest = temp.path().join("out");
        std::fs::create_dir(&dest).unwrap();
        let report = extract_zip(&archive, &dest).unwrap();

        assert_eq!(report.files_extracted, 1);
        assert!(report.skipped[0].contains("../escape.js"));
        assert!(!temp.path().join("escape.js").exists());
    }

    #[test]
    fn test_corrupt_archive_is_unreadable() {
        let temp = TempDir::new().unwrap();
        let archive = temp.path().join("broken.zip");
        std::fs::write(&archive, b"definitely not a zip").unwrap();

        let result = extract_zip(&archive, temp.path());
        assert!(matches!(result, Err(AuditError::ArchiveUnreadable { .. })));
    }

    #[test]
    fn test_missing_archive_is_unreadable() {
        let temp = TempDir::new().unwrap();
        let result = extract_zip(&temp.path().join("absent.zip"), temp.path());
        assert!(matches!(result, Err(AuditError::ArchiveUnreadable { .. })));
    }
}

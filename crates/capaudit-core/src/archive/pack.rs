//! Re-packing a scratch tree into a deflate-compressed zip.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use walkdir::WalkDir;
use zip::CompressionMethod;
use zip::ZipWriter;
use zip::write::SimpleFileOptions;

use crate::AuditError;
use crate::Result;

/// Statistics of one packing run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PackReport {
    /// Number of files written to the archive.
    pub files_added: usize,

    /// Uncompressed bytes read from the tree.
    pub bytes_read: u64,
}

/// Packs every regular file under `root` into a new zip at `output`.
///
/// Entry names are relative to `root` with `/` separators and are added in
/// lexical walk order. The archive is synced to disk before returning.
///
/// # Errors
///
/// Returns an error if the tree cannot be walked, a path is not valid UTF-8,
/// or the archive cannot be written.
pub fn pack_directory(
    root: &Path,
    output: &Path,
    compression_level: Option<u8>,
) -> Result<PackReport> {
    let options = if compression_level == Some(0) {
        SimpleFileOptions::default().compression_method(CompressionMethod::Stored)
    } else {
        let level = compression_level.unwrap_or(6);
        SimpleFileOptions::default()
            .compression_method(CompressionMethod::Deflated)
            .compression_level(Some(i64::from(level)))
    };

    let mut zip = ZipWriter::new(File::create(output)?);
    let mut report = PackReport::default();

    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = entry
            .map_err(|e| AuditError::Io(std::io::Error::other(format!("walkdir error: {e}"))))?;
        if !entry.file_type().is_file() {
            continue;
        }

        let relative = entry
            .path()
            .strip_prefix(root)
            .map_err(|e| AuditError::Io(std::io::Error::other(e.to_string())))?;
        let name = normalize_zip_path(relative)?;

        zip.start_file(name, options)?;
        let mut reader = BufReader::new(File::open(entry.path())?);
        report.bytes_read += std::io::copy(&mut reader, &mut zip)?;
        report.files_added += 1;
    }

    let file = zip.finish()?;
    file.sync_all()?;

    Ok(report)
}

/// Joins path components with `/` as required by the zip format.
fn normalize_zip_path(path: &Path) -> Result<String> {
    let mut parts = Vec::new();
    for component in path.components() {
        let part = component.as_os_str().to_str().ok_or_else(|| {
            AuditError::Io(std::io::Error::other(format!(
                "path is not valid UTF-8: {}",
                path.display()
            )))
        })?;
        parts.push(part);
    }
    Ok(parts.join("/"))
}

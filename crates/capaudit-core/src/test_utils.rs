//! Test utilities for building capsule archives in memory.
//!
//! # Panics
//!
//! All functions in this module may panic on I/O errors since they are
//! designed for test use only where panics are acceptable.

#![allow(clippy::unwrap_used, clippy::missing_panics_doc)]

use std::io::Cursor;
use std::io::Write;

use zip::write::SimpleFileOptions;
use zip::write::ZipWriter;

/// Creates an in-memory ZIP archive from a list of entries.
///
/// Each entry is a tuple of (path, content). Files are stored uncompressed
/// with mode 0o644.
///
/// # Examples
///
/// ```
/// use capaudit_core::test_utils::create_test_zip;
///
/// let zip_data = create_test_zip(&[("manifest.json", b"{}"), ("src/popup.html", b"<p/>")]);
/// ```
#[must_use]
pub fn create_test_zip(entries: &[(&str, &[u8])]) -> Vec<u8> {
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));

    let options = SimpleFileOptions::default()
        .compression_method(zip::CompressionMethod::Stored)
        .unix_permissions(0o644);

    for (path, data) in entries {
        zip.start_file(*path, options).unwrap();
        zip.write_all(data).unwrap();
    }

    zip.finish().unwrap().into_inner()
}

/// Creates a capsule archive whose manifest is the given JSON text, plus
/// any additional entries.
#[must_use]
pub fn create_capsule_zip(manifest: &str, extra: &[(&str, &[u8])]) -> Vec<u8> {
    let mut entries = vec![("manifest.json", manifest.as_bytes())];
    entries.extend_from_slice(extra);
    create_test_zip(&entries)
}

/// Lists the entry names of a ZIP archive on disk, in archive order.
#[must_use]
pub fn zip_entry_names(path: &std::path::Path) -> Vec<String> {
    let archive = zip::ZipArchive::new(std::fs::File::open(path).unwrap()).unwrap();
    archive.file_names().map(str::to_string).collect()
}

/// Reads one entry of a ZIP archive on disk as UTF-8 text.
#[must_use]
pub fn read_zip_entry(path: &std::path::Path, name: &str) -> String {
    use std::io::Read;

    let mut archive = zip::ZipArchive::new(std::fs::File::open(path).unwrap()).unwrap();
    let mut content = String::new();
    archive
        .by_name(name)
        .unwrap()
        .read_to_string(&mut content)
        .unwrap();
    content
}

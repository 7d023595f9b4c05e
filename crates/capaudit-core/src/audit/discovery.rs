//! Locating metadata files and source files inside a scratch tree.
//!
//! Lookup by file name walks breadth-first with a lexical tie-break inside
//! each directory, so the shallowest match wins and the choice does not
//! depend on filesystem enumeration order.

use std::collections::VecDeque;
use std::path::Path;
use std::path::PathBuf;

use walkdir::WalkDir;

use crate::AuditConfig;
use crate::AuditError;
use crate::Result;

/// A file located by name, plus any other candidates with the same name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileMatch {
    /// The selected candidate.
    pub path: PathBuf,

    /// Further candidates in walk order; non-empty means the choice was
    /// ambiguous.
    pub duplicates: Vec<PathBuf>,
}

impl FileMatch {
    /// Returns whether more than one candidate exists.
    #[must_use]
    pub fn is_ambiguous(&self) -> bool {
        !self.duplicates.is_empty()
    }
}

/// Finds every regular file called `file_name` under `root`.
///
/// Returns `Ok(None)` when there is no candidate. Symlinks are not
/// followed.
///
/// # Examples
///
/// ```no_run
/// use capaudit_core::audit::discovery::find_file;
/// use std::path::Path;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// if let Some(found) = find_file(Path::new("extracted_ext"), "manifest.json")? {
///     println!("manifest at {}", found.path.display());
/// }
/// # Ok(())
/// # }
/// ```
pub fn find_file(root: &Path, file_name: &str) -> Result<Option<FileMatch>> {
    let mut matches = Vec::new();
    let mut queue = VecDeque::from([root.to_path_buf()]);

    while let Some(dir) = queue.pop_front() {
        let mut entries = std::fs::read_dir(&dir)?.collect::<std::io::Result<Vec<_>>>()?;
        entries.sort_by_key(std::fs::DirEntry::file_name);

        for entry in entries {
            let file_type = entry.file_type()?;
            if file_type.is_dir() {
                queue.push_back(entry.path());
            } else if file_type.is_file() && entry.file_name() == file_name {
                matches.push(entry.path());
            }
        }
    }

    let mut iter = matches.into_iter();
    Ok(iter.next().map(|path| FileMatch {
        path,
        duplicates: iter.collect(),
    }))
}

/// Lists source files under `root` as `/`-separated relative paths, sorted.
pub fn discover_sources(root: &Path, config: &AuditConfig) -> Result<Vec<String>> {
    let mut discovered = Vec::new();
    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = entry.map_err(walk_error)?;
        if !entry.file_type().is_file() || !config.is_source_file(entry.path()) {
            continue;
        }
        if let Ok(relative) = entry.path().strip_prefix(root) {
            discovered.push(slash_path(relative));
        }
    }
    Ok(discovered)
}

/// Counts regular files under `root`.
pub fn count_files(root: &Path) -> Result<usize> {
    let mut count = 0;
    for entry in WalkDir::new(root) {
        if entry.map_err(walk_error)?.file_type().is_file() {
            count += 1;
        }
    }
    Ok(count)
}

fn slash_path(path: &Path) -> String {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

fn walk_error(err: walkdir::Error) -> AuditError {
    AuditError::Io(std::io::Error::other(format!("walkdir error: {err}")))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn touch(root: &Path, rel: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, "x").unwrap();
    }

    #[test]
    fn test_find_file_absent() {
        let temp = TempDir::new().unwrap();
        touch(temp.path(), "a/other.json");
        assert!(find_file(temp.path(), "manifest.json").unwrap().is_none());
    }

    #[test]
    fn test_shallowest_match_wins() {
        let temp = TempDir::new().unwrap();
        touch(temp.path(), "a/b/manifest.json");
        touch(temp.path(), "z/manifest.json");

        let found = find_file(temp.path(), "manifest.json").unwrap().unwrap();
        assert_eq!(found.path, temp.path().join("z/manifest.json"));
        assert_eq!(found.duplicates, vec![temp.path().join("a/b/manifest.json")]);
        assert!(found.is_ambiguous());
    }

    #[test]
    fn test_lexical_tie_break_at_same_depth() {
        let temp = TempDir::new().unwrap();
        touch(temp.path(), "beta/reflect.yaml");
        touch(temp.path(), "alpha/reflect.yaml");

        let found = find_file(temp.path(), "reflect.yaml").unwrap().unwrap();
        assert_eq!(found.path, temp.path().join("alpha/reflect.yaml"));
    }

    #[test]
    fn test_directory_with_target_name_is_ignored() {
        let temp = TempDir::new().unwrap();
        fs::create_dir_all(temp.path().join("manifest.json")).unwrap();
        assert!(find_file(temp.path(), "manifest.json").unwrap().is_none());
    }

    #[test]
    fn test_discover_sources() {
        let temp = TempDir::new().unwrap();
        touch(temp.path(), "popup.html");
        touch(temp.path(), "scripts/content.js");
        touch(temp.path(), "tools/build.py");
        touch(temp.path(), "manifest.json");
        touch(temp.path(), "reflect.yaml");

        let files = discover_sources(temp.path(), &AuditConfig::default()).unwrap();
        assert_eq!(files, vec!["popup.html", "scripts/content.js", "tools/build.py"]);
    }

    #[test]
    fn test_count_files() {
        let temp = TempDir::new().unwrap();
        touch(temp.path(), "a.js");
        touch(temp.path(), "deep/er/b.txt");
        assert_eq!(count_files(temp.path()).unwrap(), 2);
    }
}

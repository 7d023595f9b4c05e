//! SHA-256 signature sidecars in `sha256sum` format.
//!
//! A sidecar sits next to the archive as `<archive>.sig` and holds
//! `<64 hex chars>  <basename>`, so `sha256sum -c` can check it.

use std::fs::File;
use std::io::Read;
use std::io::Write;
use std::path::Path;
use std::path::PathBuf;

use serde::Serialize;
use sha2::Digest;
use sha2::Sha256;

use crate::AuditError;
use crate::Result;

/// Suffix appended to the archive file name to form the sidecar name.
pub const SIGNATURE_SUFFIX: &str = ".sig";

/// Integrity stamp of one archive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SignatureRecord {
    /// Lowercase hex SHA-256 digest.
    pub digest: String,

    /// Archive base name.
    pub file_name: String,
}

impl SignatureRecord {
    /// Parses a sidecar line.
    ///
    /// # Examples
    ///
    /// ```
    /// use capaudit_core::SignatureRecord;
    ///
    /// let line = format!("{}  ext_REPAIRED.zip", "ab".repeat(32));
    /// let record = SignatureRecord::parse(&line).unwrap();
    /// assert_eq!(record.file_name, "ext_REPAIRED.zip");
    /// assert!(SignatureRecord::parse("abc ext.zip").is_none());
    /// ```
    #[must_use]
    pub fn parse(line: &str) -> Option<Self> {
        let line = line.lines().next()?.trim_end();
        let (digest, file_name) = line.split_once("  ")?;
        let digest = digest.trim();
        // `sha256sum -b` marks binary mode with a leading '*'
        let file_name = file_name.strip_prefix('*').unwrap_or(file_name);
        let well_formed = digest.len() == 64 && digest.bytes().all(|b| b.is_ascii_hexdigit());
        if !well_formed || file_name.is_empty() {
            return None;
        }
        Some(Self {
            digest: digest.to_ascii_lowercase(),
            file_name: file_name.to_string(),
        })
    }

    /// Renders the sidecar content.
    #[must_use]
    pub fn to_line(&self) -> String {
        format!("{}  {}", self.digest, self.file_name)
    }
}

/// Result of checking an archive against its sidecar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SignatureCheck {
    /// Archive that was hashed.
    pub archive: PathBuf,

    /// Digest recorded in the sidecar.
    pub expected: String,

    /// Digest computed from the archive bytes.
    pub actual: String,
}

impl SignatureCheck {
    /// Returns whether the digests agree.
    #[must_use]
    pub fn matches(&self) -> bool {
        self.expected == self.actual
    }

    /// Converts a mismatch into an error.
    pub fn into_result(self) -> Result<Self> {
        if self.matches() {
            Ok(self)
        } else {
            Err(AuditError::SignatureMismatch {
                expected: self.expected,
                actual: self.actual,
            })
        }
    }
}

/// Returns `<archive>.sig`.
#[must_use]
pub fn sidecar_path(archive: &Path) -> PathBuf {
    let mut name = archive.as_os_str().to_os_string();
    name.push(SIGNATURE_SUFFIX);
    PathBuf::from(name)
}

/// Streams `path` through SHA-256 and returns the lowercase hex digest.
pub fn sha256_file(path: &Path) -> Result<String> {
    let mut file = File::open(path)?;
    let mut hasher = Sha256::new();
    let mut buffer = vec![0u8; 64 * 1024];
    loop {
        let read = file.read(&mut buffer)?;
        if read == 0 {
            break;
        }
        hasher.update(&buffer[..read]);
    }
    Ok(hex::encode(hasher.finalize()))
}

/// Hashes the finished archive and writes its sidecar.
///
/// Must only be called once the archive bytes are final and synced.
pub fn sign_archive(archive: &Path) -> Result<SignatureRecord> {
    let file_name = archive
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| {
            AuditError::Io(std::io::Error::other(format!(
                "archive name is not valid UTF-8: {}",
                archive.display()
            )))
        })?
        .to_string();

    let record = SignatureRecord {
        digest: sha256_file(archive)?,
        file_name,
    };

    let mut sidecar = File::create(sidecar_path(archive))?;
    sidecar.write_all(record.to_line().as_bytes())?;
    sidecar.sync_all()?;

    Ok(record)
}

/// Recomputes the digest of `archive` and compares it with its sidecar.
///
/// # Errors
///
/// Returns `AuditError::MissingSignature` if the sidecar is absent or
/// malformed. A digest mismatch is reported through
/// [`SignatureCheck::matches`], not as an error.
pub fn verify_signature(archive: &Path) -> Result<SignatureCheck> {
    let sidecar = sidecar_path(archive);
    let missing = || AuditError::MissingSignature {
        path: sidecar.clone(),
    };

    let text = std::fs::read_to_string(&sidecar).map_err(|_| missing())?;
    let record = SignatureRecord::parse(&text).ok_or_else(missing)?;

    Ok(SignatureCheck {
        archive: archive.to_path_buf(),
        expected: record.digest,
        actual: sha256_file(archive)?,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    // sha256("abc")
    const ABC_DIGEST: &str = "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad";

    #[test]
    fn test_sha256_known_vector() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("abc.bin");
        std::fs::write(&path, b"abc").unwrap();
        assert_eq!(sha256_file(&path).unwrap(), ABC_DIGEST);
    }

    #[test]
    fn test_sidecar_path_appends_suffix() {
        assert_eq!(
            sidecar_path(Path::new("/out/ext_REPAIRED.zip")),
            PathBuf::from("/out/ext_REPAIRED.zip.sig")
        );
    }

    #[test]
    fn test_sign_writes_checksum_line() {
        let temp = TempDir::new().unwrap();
        let archive = temp.path().join("ext_REPAIRED.zip");
        std::fs::write(&archive, b"abc").unwrap();

        let record = sign_archive(&archive).unwrap();
        let sidecar = std::fs::read_to_string(sidecar_path(&archive)).unwrap();

        assert_eq!(record.digest, ABC_DIGEST);
        assert_eq!(sidecar, format!("{ABC_DIGEST}  ext_REPAIRED.zip"));
    }

    #[test]
    fn test_verify_detects_tampering() {
        let temp = TempDir::new().unwrap();
        let archive = temp.path().join("ext_REPAIRED.zip");
        std::fs::write(&archive, b"abc").unwrap();
        sign_archive(&archive).unwrap();

        assert!(verify_signature(&archive).unwrap().matches());

        std::fs::write(&archive, b"abd").unwrap();
        let check = verify_signature(&archive).unwrap();
        assert!(!check.matches());
        assert!(matches!(
            check.into_result(),
            Err(AuditError::SignatureMismatch { .. })
        ));
    }

    #[test]
    fn test_verify_without_sidecar() {
        let temp = TempDir::new().unwrap();
        let archive = temp.path().join("unsigned.zip");
        std::fs::write(&archive, b"abc").unwrap();
        assert!(matches!(
            verify_signature(&archive),
            Err(AuditError::MissingSignature { .. })
        ));
    }

    #[test]
    fn test_parse_accepts_binary_marker_and_newline() {
        let line = format!("{ABC_DIGEST}  *ext.zip\n");
        let record = SignatureRecord::parse(&line).unwrap();
        assert_eq!(record.file_name, "ext.zip");
        assert_eq!(record.to_line(), format!("{ABC_DIGEST}  ext.zip"));
    }

    #[test]
    fn test_parse_rejects_short_digest() {
        assert!(SignatureRecord::parse("abcd  ext.zip").is_none());
        assert!(SignatureRecord::parse("").is_none());
    }
}

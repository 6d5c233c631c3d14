//! Streaming checksum verification.

use super::check_name;
use crate::core::ValidationResult;
use md5::Md5;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::{ErrorKind, Read};
use std::path::Path;
use tracing::{debug, instrument, warn};

/// Bytes read per chunk. Memory use is bounded by this regardless of file size.
const CHUNK_SIZE: usize = 64 * 1024;

/// Supported digest algorithms.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChecksumAlgorithm {
    /// MD5, the digest most dataset hosts publish
    #[default]
    Md5,
    /// SHA-256
    Sha256,
}

impl ChecksumAlgorithm {
    /// Short lowercase name, also used as the check name prefix.
    pub fn name(&self) -> &'static str {
        match self {
            ChecksumAlgorithm::Md5 => "md5",
            ChecksumAlgorithm::Sha256 => "sha256",
        }
    }

    /// Length of the hex-encoded digest.
    pub fn hex_len(&self) -> usize {
        match self {
            ChecksumAlgorithm::Md5 => 32,
            ChecksumAlgorithm::Sha256 => 64,
        }
    }

    /// Returns true if `digest` is a well-formed hex digest for this algorithm.
    pub fn is_valid_digest(&self, digest: &str) -> bool {
        let digest = digest.trim();
        digest.len() == self.hex_len() && digest.chars().all(|c| c.is_ascii_hexdigit())
    }

    /// Computes the lowercase hex digest of a file.
    pub fn digest_file(&self, path: &Path) -> std::io::Result<String> {
        match self {
            ChecksumAlgorithm::Md5 => stream_digest::<Md5>(path),
            ChecksumAlgorithm::Sha256 => stream_digest::<Sha256>(path),
        }
    }
}

fn stream_digest<H: Digest>(path: &Path) -> std::io::Result<String> {
    // The handle is dropped on every return path, including errors.
    let mut file = File::open(path)?;
    let mut hasher = H::new();
    let mut buffer = vec![0u8; CHUNK_SIZE];
    loop {
        let read = match file.read(&mut buffer) {
            Ok(0) => break,
            Ok(read) => read,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };
        hasher.update(&buffer[..read]);
    }
    Ok(hex::encode(hasher.finalize()))
}

/// Verifies a file's MD5 digest.
///
/// See [`verify_checksum`].
pub fn verify_md5(path: impl AsRef<Path>, expected_digest: &str) -> ValidationResult {
    verify_checksum(path, expected_digest, ChecksumAlgorithm::Md5)
}

/// Verifies a file's digest against `expected_digest`.
///
/// The expected digest is compared case-insensitively after trimming. The
/// details of a failed result start with either `unreadable/missing:` (the
/// file could not be opened or read) or `digest mismatch` (the file was read
/// and hashed to something else).
pub fn verify_checksum(
    path: impl AsRef<Path>,
    expected_digest: &str,
    algorithm: ChecksumAlgorithm,
) -> ValidationResult {
    let path = path.as_ref();
    let name = check_name(algorithm.name(), &path.display().to_string());
    verify_checksum_named(name, path, expected_digest, algorithm)
}

/// Like [`verify_checksum`], with the result carrying `name` instead of a
/// name derived from `path`.
#[instrument(skip(path), fields(check.path = %path.display()))]
pub(crate) fn verify_checksum_named(
    name: String,
    path: &Path,
    expected_digest: &str,
    algorithm: ChecksumAlgorithm,
) -> ValidationResult {
    let expected = expected_digest.trim().to_ascii_lowercase();

    match algorithm.digest_file(path) {
        Err(e) => {
            warn!(error = %e, "Could not read file for checksum");
            ValidationResult::fail(
                name,
                format!("unreadable/missing: {} ({e})", path.display()),
            )
        }
        Ok(actual) if actual == expected => {
            debug!(digest = %actual, "Checksum verified");
            ValidationResult::pass(name)
        }
        Ok(actual) => ValidationResult::fail(
            name,
            format!(
                "digest mismatch for {}: got {actual}, expected {expected}",
                path.display()
            ),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    const HELLO_MD5: &str = "5eb63bbbe01eeed093cb22bb8f5acdc3";
    const HELLO_SHA256: &str = "b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9";

    #[test]
    fn test_md5_match() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("archive.zip");
        fs::write(&path, b"hello world").unwrap();

        let result = verify_md5(&path, HELLO_MD5);
        assert!(result.passed(), "{result}");
        assert!(verify_md5(&path, &HELLO_MD5.to_uppercase()).passed());
        assert!(verify_md5(&path, &format!("  {HELLO_MD5}\n")).passed());
    }

    #[test]
    fn test_md5_mismatch() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("archive.zip");
        fs::write(&path, b"hello world!").unwrap();

        let result = verify_md5(&path, HELLO_MD5);
        assert!(!result.passed());
        assert!(result.details().starts_with("digest mismatch"));
        assert!(result.details().contains(&format!("expected {HELLO_MD5}")));
    }

    #[test]
    fn test_missing_file_is_distinguished_from_mismatch() {
        let dir = tempfile::tempdir().unwrap();
        let result = verify_md5(dir.path().join("absent.zip"), HELLO_MD5);
        assert!(!result.passed());
        assert!(result.details().starts_with("unreadable/missing:"));
        assert!(!result.details().contains("digest mismatch"));
    }

    #[test]
    fn test_directory_is_unreadable() {
        let dir = tempfile::tempdir().unwrap();
        let result = verify_md5(dir.path(), HELLO_MD5);
        assert!(!result.passed());
        assert!(result.details().starts_with("unreadable/missing:"));
    }

    #[test]
    fn test_sha256() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("t1w.nii.gz");
        fs::write(&path, b"hello world").unwrap();

        let result = verify_checksum(&path, HELLO_SHA256, ChecksumAlgorithm::Sha256);
        assert!(result.passed());
        assert!(result.check_name().starts_with("sha256:"));
    }

    #[test]
    fn test_multi_chunk_file_matches_in_memory_digest() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("large.bin");
        let data: Vec<u8> = (0..(3 * CHUNK_SIZE + 17)).map(|i| (i % 251) as u8).collect();
        fs::write(&path, &data).unwrap();

        let expected = hex::encode(Md5::digest(&data));
        assert_eq!(ChecksumAlgorithm::Md5.digest_file(&path).unwrap(), expected);
        assert!(verify_md5(&path, &expected).passed());
    }

    #[test]
    fn test_named_result_keeps_given_name() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("archive.zip");
        fs::write(&path, b"hello world").unwrap();

        let result = verify_checksum_named(
            "md5:archive.zip".to_string(),
            &path,
            HELLO_MD5,
            ChecksumAlgorithm::Md5,
        );
        assert!(result.passed());
        assert_eq!(result.check_name(), "md5:archive.zip");
        assert!(verify_md5(&path, HELLO_MD5).check_name().ends_with("archive.zip"));
    }

    #[test]
    fn test_digest_validation() {
        assert!(ChecksumAlgorithm::Md5.is_valid_digest(HELLO_MD5));
        assert!(!ChecksumAlgorithm::Md5.is_valid_digest(HELLO_SHA256));
        assert!(!ChecksumAlgorithm::Md5.is_valid_digest("zz63bbbe01eeed093cb22bb8f5acdc3z"));
        assert!(ChecksumAlgorithm::Sha256.is_valid_digest(HELLO_SHA256));
    }

    #[test]
    fn test_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.bin");
        fs::write(&path, b"abc").unwrap();
        assert_eq!(verify_md5(&path, HELLO_MD5), verify_md5(&path, HELLO_MD5));
    }
}

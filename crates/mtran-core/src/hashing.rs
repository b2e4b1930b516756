use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result};
use sha2::{Digest, Sha256};

/// Computes the lowercase hex SHA-256 digest of a file's contents.
pub fn sha256_file(path: &Path) -> Result<String> {
    let mut file =
        std::fs::File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
    let mut hasher = Sha256::new();
    let mut buf = [0u8; 64 * 1024];
    loop {
        let read = file
            .read(&mut buf)
            .with_context(|| format!("failed to read {}", path.display()))?;
        if read == 0 {
            break;
        }
        hasher.update(&buf[..read]);
    }
    Ok(hex::encode(hasher.finalize()))
}

/// Computes the lowercase hex SHA-256 digest of in-memory bytes.
pub fn sha256_bytes(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

/// Returns Ok(()) if the file at `path` hashes to `expected_hex`, case-insensitively.
pub fn verify_sha256_file(path: &Path, expected_hex: &str) -> Result<()> {
    let actual = sha256_file(path)?;
    if !actual.eq_ignore_ascii_case(expected_hex) {
        anyhow::bail!("sha256 mismatch: expected {expected_hex}, actual {actual}");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sha256_bytes_matches_known_vector() {
        // sha256("") == e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b85
        assert_eq!(
            sha256_bytes(b""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b85"
        );
    }

    #[test]
    fn verify_sha256_file_accepts_matching_hash_case_insensitively() {
        let tempdir = tempfile::tempdir().expect("tempdir");
        let path = tempdir.path().join("payload.bin");
        std::fs::write(&path, b"hello").expect("write");
        let hash = sha256_file(&path).expect("hash");
        verify_sha256_file(&path, &hash.to_uppercase()).expect("verify");
    }

    #[test]
    fn verify_sha256_file_rejects_mismatch() {
        let tempdir = tempfile::tempdir().expect("tempdir");
        let path = tempdir.path().join("payload.bin");
        std::fs::write(&path, b"hello").expect("write");
        let err = verify_sha256_file(&path, "0".repeat(64).as_str()).unwrap_err();
        assert!(err.to_string().contains("mismatch"));
    }
}

use anyhow::{Context, Result};
use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

const READ_BUFFER_BYTES: usize = 64 * 1024;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("sha256 mismatch: got {computed} want {expected}")]
pub struct DigestMismatch {
    pub computed: String,
    pub expected: String,
}

pub fn sha256_hex(payload: &[u8]) -> String {
    hex::encode(Sha256::digest(payload))
}

pub fn sha256_reader_hex<R: Read>(mut reader: R) -> io::Result<String> {
    let mut hasher = Sha256::new();
    let mut buffer = vec![0_u8; READ_BUFFER_BYTES];
    loop {
        let read = match reader.read(&mut buffer) {
            Ok(0) => break,
            Ok(read) => read,
            Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
            Err(err) => return Err(err),
        };
        hasher.update(&buffer[..read]);
    }
    Ok(hex::encode(hasher.finalize()))
}

pub fn sha256_file_hex(path: &Path) -> Result<String> {
    let file = File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
    sha256_reader_hex(file).with_context(|| format!("failed to hash {}", path.display()))
}

/// Lowercases, trims, and strips one optional `0x` prefix.
pub fn normalize_sha256_hex(expected: &str) -> String {
    let lowered = expected.trim().to_ascii_lowercase();
    match lowered.strip_prefix("0x") {
        Some(stripped) => stripped.to_string(),
        None => lowered,
    }
}

pub fn verify_sha256(payload: &[u8], expected_hex: &str) -> Result<(), DigestMismatch> {
    compare(sha256_hex(payload), expected_hex)
}

pub fn verify_sha256_file(path: &Path, expected_hex: &str) -> Result<()> {
    let computed = sha256_file_hex(path)?;
    compare(computed, expected_hex)
        .with_context(|| format!("checksum verification failed for {}", path.display()))
}

fn compare(computed: String, expected_hex: &str) -> Result<(), DigestMismatch> {
    let expected = normalize_sha256_hex(expected_hex);
    if computed == expected {
        return Ok(());
    }
    Err(DigestMismatch { computed, expected })
}

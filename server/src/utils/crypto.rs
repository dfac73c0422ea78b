//! Hashing helpers

use sha2::{Digest, Sha256};

/// Lowercase hex SHA-256 of a string (migration checksums)
pub fn sha256_hex(data: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data.as_bytes());
    hex::encode(hasher.finalize())
}

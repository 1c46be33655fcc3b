//! Content fingerprints for the known-state cache
//!
//! Fingerprints are `sha256:<hex>` strings. The cache stores one per path
//! so it can tell whether local content moved without keeping a second
//! copy of every file.

use sha2::{Digest, Sha256};

const PREFIX: &str = "sha256:";

/// Fingerprint text content.
pub fn compute_content_checksum(content: &str) -> String {
    format!("{}{:x}", PREFIX, Sha256::digest(content.as_bytes()))
}

/// Whether `content` still has the fingerprint `checksum`.
///
/// A fingerprint in any other format never matches.
pub fn content_matches(checksum: &str, content: &str) -> bool {
    checksum.starts_with(PREFIX) && checksum == compute_content_checksum(content)
}

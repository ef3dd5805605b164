//! Checksums of embedded migration SQL
//!
//! A recorded checksum that no longer matches the embedded script means the
//! database was created by a different build of the schema.

use sha2::{Digest, Sha256};

/// SHA-256 of the script with line endings normalised to `\n`
pub fn compute_checksum(sql: &str) -> String {
    let mut hasher = Sha256::new();
    for line in sql.lines() {
        hasher.update(line.trim_end_matches('\r').as_bytes());
        hasher.update(b"\n");
    }
    hex::encode(hasher.finalize())
}

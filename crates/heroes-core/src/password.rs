//! Password hashing stub
//!
//! Not a password KDF: a plain unsalted SHA-256 digest so that stored rows
//! never hold the clear text. Swap for argon2 before anything real depends
//! on it.

use heroes_core_types::Sensitive;
use sha2::{Digest, Sha256};

const SCHEME: &str = "sha256:";

/// Hash a clear-text password into its stored form
pub fn hash_password(password: &Sensitive<String>) -> Sensitive<String> {
    let mut hasher = Sha256::new();
    hasher.update(password.expose().as_bytes());
    Sensitive::new(format!("{}{}", SCHEME, hex::encode(hasher.finalize())))
}

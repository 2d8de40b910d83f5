//! Cryptographic utilities for claim tokens and document ids.

use rand::RngCore;
use sha2::{Digest, Sha256};

/// Number of random bytes behind a generated document id.
///
/// Hex-encoded this gives 32 characters, inside the 36 character limit the
/// hosted document database places on custom ids.
const DOCUMENT_ID_BYTES: usize = 16;

/// Length of the fingerprint logged in place of a claim token.
const FINGERPRINT_LEN: usize = 12;

/// Computes SHA-256 hash of the input and returns it as a hex string.
pub fn sha256_hex(input: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(input.as_bytes());
    hex::encode(hasher.finalize())
}

/// Generates a random document id usable as a claim token.
pub fn generate_document_id() -> String {
    let mut bytes = [0u8; DOCUMENT_ID_BYTES];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Short, non-reversible fingerprint of a secret token for log lines.
pub fn token_fingerprint(token: &str) -> String {
    let mut hash = sha256_hex(token);
    hash.truncate(FINGERPRINT_LEN);
    hash
}

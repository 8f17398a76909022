//! src/pow.rs
//!
//! Admission proof-of-work (§4.3): a cheap computational puzzle attached to
//! HELLO messages so a receiver can raise the cost of Sybil joins without a
//! PKI. Hash is SHA-256; difficulty `k` counts required leading hex zero
//! nibbles.

use sha2::{Digest, Sha256};

/// Computes `SHA256(node_id || decimal(nonce))` and returns its hex digest.
fn digest_hex(node_id: &str, nonce: u64) -> String {
    let mut hasher = Sha256::new();
    hasher.update(node_id.as_bytes());
    hasher.update(nonce.to_string().as_bytes());
    hex::encode(hasher.finalize())
}

fn has_leading_zero_nibbles(digest: &str, k: u32) -> bool {
    digest
        .as_bytes()
        .iter()
        .take(k as usize)
        .all(|&b| b == b'0')
}

/// Finds the smallest `nonce >= 0` such that `digest_hex(node_id, nonce)`
/// has `k` leading hex zero nibbles. No time bound: expected work is `16^k`.
pub fn mine(node_id: &str, k: u32) -> (u64, String) {
    let mut nonce: u64 = 0;
    loop {
        let digest = digest_hex(node_id, nonce);
        if has_leading_zero_nibbles(&digest, k) {
            return (nonce, digest);
        }
        nonce += 1;
    }
}

/// Recomputes the digest for `(sender_id, nonce)` and checks the prefix.
/// Vacuously true when `k == 0`.
pub fn verify(sender_id: &str, nonce: u64, k: u32) -> bool {
    if k == 0 {
        return true;
    }
    has_leading_zero_nibbles(&digest_hex(sender_id, nonce), k)
}

//! Reference proof search.
//!
//! Grinds proof inputs for one request: sign the canonical message for each
//! candidate input and keep the first signature whose integer form passes
//! the divisibility gate. Hosts running a real solver would parallelize
//! and persist progress; this loop is the minimal correct search used by
//! the test suite and by single-process hosts.

use tracing::debug;

use ember_core::codec;
use ember_core::crypto::KeyPair;
use ember_core::types::{Hash256, Signature};

/// Search for a proof input whose signature clears `difficulty`.
///
/// Tries inputs `0..max_attempts` in order and returns the first
/// `(proof_input, signature)` that qualifies, or `None` if the budget is
/// exhausted. Expected work is `difficulty` signatures.
///
/// Ed25519 signing is deterministic per (key, message), so retrying the
/// same input never helps; the proof input is the only search dimension.
pub fn search_proof(
    keypair: &KeyPair,
    predecessor: &Hash256,
    difficulty: u64,
    max_attempts: u64,
) -> Option<(u64, Signature)> {
    for proof_input in 0..max_attempts {
        let message = codec::message_hash(predecessor, proof_input);
        let signature = keypair.sign(message.as_bytes());
        if codec::signature_integer(&signature).is_divisible_by(difficulty) {
            debug!(proof_input, difficulty, "proof found");
            return Some((proof_input, signature));
        }
    }
    None
}

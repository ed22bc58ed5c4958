//! Message and proof codec: the pure leaf of the beacon.
//!
//! Derives the canonical message a solver must sign for a given request,
//! converts raw signatures into comparable integers for the divisibility
//! gate, and mixes the genesis and fulfillment random values.
//!
//! All preimages use explicit fixed little-endian byte layouts hashed with
//! BLAKE3; nothing here depends on ledger state, so any party can
//! precompute messages and self-check candidate proofs off-line.

use std::fmt;

use crate::types::{ChainSnapshot, Hash256, Signature};

/// The canonical message to sign for one fulfillment attempt.
///
/// Layout: `predecessor (32) || proof_input (8 LE)`. The predecessor is the
/// random value at `id - 1` (`Hash256::ZERO` for id 0), which is what chains
/// every output to the one before it.
pub fn message_hash(predecessor: &Hash256, proof_input: u64) -> Hash256 {
    let mut data = Vec::with_capacity(40);
    data.extend_from_slice(predecessor.as_bytes());
    data.extend_from_slice(&proof_input.to_le_bytes());
    Hash256(blake3::hash(&data).into())
}

/// Big-endian integer view of a 64-byte signature.
///
/// The full signature width is kept; divisibility checks reduce it with
/// modular folding rather than truncating to a machine word.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct SigInt(pub [u8; 64]);

impl SigInt {
    /// Remainder of this integer modulo `modulus`.
    ///
    /// Computed by folding the bytes most-significant first, reducing after
    /// each byte; the accumulator stays below `modulus * 256` so u128
    /// intermediate arithmetic never overflows. A zero modulus is treated
    /// as trivially divisible (the ledger difficulty never drops below
    /// [`MIN_DIFFICULTY`](crate::constants::MIN_DIFFICULTY)).
    pub fn rem(&self, modulus: u64) -> u64 {
        if modulus == 0 {
            return 0;
        }
        let m = modulus as u128;
        let acc = self
            .0
            .iter()
            .fold(0u128, |acc, &byte| ((acc << 8) | byte as u128) % m);
        acc as u64
    }

    /// Whether this integer passes the proof-of-work gate for `modulus`.
    pub fn is_divisible_by(&self, modulus: u64) -> bool {
        self.rem(modulus) == 0
    }
}

impl fmt::Debug for SigInt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SigInt({})", hex::encode(self.0))
    }
}

impl fmt::Display for SigInt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

/// Convert a raw signature to its big-endian integer view.
pub fn signature_integer(signature: &Signature) -> SigInt {
    SigInt(*signature.as_bytes())
}

/// Batch conversion utility for solvers self-checking candidate proofs.
pub fn convert_signatures(signatures: &[Signature]) -> Vec<SigInt> {
    signatures.iter().map(signature_integer).collect()
}

/// The genesis (id 0) random value.
///
/// Mixes the caller-supplied seed with chain-context entropy and the beacon
/// address so distinct deployments seed distinct ladders.
///
/// Layout: `seed (8 LE) || caller (32) || gas_price (8 LE) ||
/// block_number (8 LE) || timestamp (8 LE) || prev_block_hash (32) ||
/// beacon_address (32)`.
pub fn genesis_value(
    seed: u64,
    caller: &Hash256,
    snapshot: &ChainSnapshot,
    beacon_address: &Hash256,
) -> Hash256 {
    let mut data = Vec::with_capacity(128);
    data.extend_from_slice(&seed.to_le_bytes());
    data.extend_from_slice(caller.as_bytes());
    data.extend_from_slice(&snapshot.gas_price.to_le_bytes());
    data.extend_from_slice(&snapshot.block_number.to_le_bytes());
    data.extend_from_slice(&snapshot.timestamp.to_le_bytes());
    data.extend_from_slice(snapshot.prev_block_hash.as_bytes());
    data.extend_from_slice(beacon_address.as_bytes());
    Hash256(blake3::hash(&data).into())
}

/// The random value produced by one accepted fulfillment.
///
/// A keyed mix of the solver's proof input, the predecessor value, the
/// request initializer, and chain-context fields the solver cannot fully
/// control.
///
/// Layout: `proof_input (8 LE) || predecessor (32) || initializer (32) ||
/// gas_price (8 LE) || block_number (8 LE) || block_entropy (32) ||
/// prev_block_hash (32) || beacon_address (32)`.
pub fn fulfillment_value(
    proof_input: u64,
    predecessor: &Hash256,
    initializer: &Hash256,
    snapshot: &ChainSnapshot,
    beacon_address: &Hash256,
) -> Hash256 {
    let mut data = Vec::with_capacity(184);
    data.extend_from_slice(&proof_input.to_le_bytes());
    data.extend_from_slice(predecessor.as_bytes());
    data.extend_from_slice(initializer.as_bytes());
    data.extend_from_slice(&snapshot.gas_price.to_le_bytes());
    data.extend_from_slice(&snapshot.block_number.to_le_bytes());
    data.extend_from_slice(snapshot.block_entropy.as_bytes());
    data.extend_from_slice(snapshot.prev_block_hash.as_bytes());
    data.extend_from_slice(beacon_address.as_bytes());
    Hash256(blake3::hash(&data).into())
}

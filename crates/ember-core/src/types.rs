//! Core beacon types: hashes, request bookkeeping, chain context.
//!
//! All numeric fields use u64 per protocol convention. Random outputs,
//! account ids (BLAKE3 pubkey hashes), and block hashes share the
//! [`Hash256`] representation.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

use crate::error::CryptoError;

/// Identifier of one randomness request.
///
/// Assigned from a single global counter starting at 1; slot 0 holds the
/// genesis random value seeded at construction time.
pub type RequestId = u64;

/// A 32-byte hash value.
///
/// Used for random outputs (BLAKE3), account ids (BLAKE3 pubkey hashes),
/// and block hashes supplied by the chain context.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Hash256(pub [u8; 32]);

impl Hash256 {
    /// The zero hash (32 zero bytes). The "unfulfilled" sentinel: genuine
    /// random outputs are full-width digests and never equal zero in practice.
    pub const ZERO: Self = Self([0u8; 32]);

    /// Create a Hash256 from a byte array.
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Return the underlying bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Check if this is the zero hash.
    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 32]
    }
}

impl fmt::Display for Hash256 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in &self.0 {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

impl From<[u8; 32]> for Hash256 {
    fn from(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }
}

impl AsRef<[u8]> for Hash256 {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

/// A raw 64-byte Ed25519 signature.
///
/// Doubles as the proof-of-work witness: its big-endian integer value must
/// be divisible by the current difficulty to be accepted.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Signature(pub [u8; 64]);

impl Signature {
    /// Create a signature from raw bytes.
    pub fn from_bytes(bytes: [u8; 64]) -> Self {
        Self(bytes)
    }

    /// Parse a signature from a byte slice (must be exactly 64 bytes).
    pub fn from_slice(bytes: &[u8]) -> Result<Self, CryptoError> {
        let arr: [u8; 64] = bytes.try_into().map_err(|_| CryptoError::InvalidSignature)?;
        Ok(Self(arr))
    }

    /// Return the underlying bytes.
    pub fn as_bytes(&self) -> &[u8; 64] {
        &self.0
    }
}

impl fmt::Debug for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Signature({})", hex::encode(self.0))
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

// Serde for [u8; 64] is hand-rolled (hex string) since serde has no
// built-in impl at that width.
impl Serialize for Signature {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        hex::encode(self.0).serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Signature {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        let bytes = hex::decode(&s).map_err(serde::de::Error::custom)?;
        Self::from_slice(&bytes).map_err(serde::de::Error::custom)
    }
}

/// Chain-context fields captured from the environment at one instant.
///
/// Fed into the codec mixers so random outputs commit to block-native
/// entropy the solver cannot fully control.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct ChainSnapshot {
    /// Current block number.
    pub block_number: u64,
    /// Gas price of the current call.
    pub gas_price: u64,
    /// Current block timestamp (Unix seconds).
    pub timestamp: u64,
    /// Hash of the previous block.
    pub prev_block_hash: Hash256,
    /// Block difficulty / randomness-beacon field of the current block.
    pub block_entropy: Hash256,
}

/// Bookkeeping for one pending or historical randomness request.
///
/// Never deleted: the reward is zeroed once paid and the entry retained
/// for auditability.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct Request {
    /// Account id of the requester (payout routing only).
    pub initializer: Hash256,
    /// Reward escrowed for whoever fulfills this id. Zero once paid.
    pub reward: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_hash_is_zero() {
        assert!(Hash256::ZERO.is_zero());
        assert!(!Hash256([1; 32]).is_zero());
    }

    #[test]
    fn hash_display_is_hex() {
        let h = Hash256([0xAB; 32]);
        assert_eq!(h.to_string(), "ab".repeat(32));
    }

    #[test]
    fn hash_serde_json_roundtrip() {
        let h = Hash256([7; 32]);
        let json = serde_json::to_string(&h).unwrap();
        let back: Hash256 = serde_json::from_str(&json).unwrap();
        assert_eq!(h, back);
    }

    #[test]
    fn signature_from_slice_rejects_bad_length() {
        assert_eq!(
            Signature::from_slice(&[0u8; 63]).unwrap_err(),
            CryptoError::InvalidSignature
        );
        assert!(Signature::from_slice(&[0u8; 64]).is_ok());
    }

    #[test]
    fn signature_serde_json_roundtrip() {
        let sig = Signature([0x5A; 64]);
        let json = serde_json::to_string(&sig).unwrap();
        let back: Signature = serde_json::from_str(&json).unwrap();
        assert_eq!(sig, back);
    }

    #[test]
    fn signature_display_is_hex() {
        let sig = Signature([0x01; 64]);
        assert_eq!(sig.to_string(), "01".repeat(64));
    }

    #[test]
    fn chain_snapshot_serde_roundtrip() {
        let snap = ChainSnapshot {
            block_number: 42,
            gas_price: 7,
            timestamp: 1_700_000_000,
            prev_block_hash: Hash256([1; 32]),
            block_entropy: Hash256([2; 32]),
        };
        let json = serde_json::to_string(&snap).unwrap();
        assert_eq!(snap, serde_json::from_str(&json).unwrap());
    }
}

//! Ed25519 cryptographic operations for the Ember beacon.
//!
//! Uses ed25519-dalek for signing and verification and BLAKE3 for account
//! id derivation. A solver's identity is the BLAKE3 hash of its 32-byte
//! public key; fulfillment proofs must verify under the public key whose
//! hash receives the payout, which is what binds a proof to its caller.

use ed25519_dalek::{Signer, Verifier};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

use crate::error::CryptoError;
use crate::types::{Hash256, Signature};

/// Ed25519 keypair used by solvers to sign proof messages.
///
/// Wraps [`ed25519_dalek::SigningKey`]; the secret key is zeroized on drop
/// by the underlying library.
pub struct KeyPair {
    signing_key: ed25519_dalek::SigningKey,
}

impl KeyPair {
    /// Generate a random keypair using the OS cryptographic RNG.
    pub fn generate() -> Self {
        let mut csprng = rand::rngs::OsRng;
        Self {
            signing_key: ed25519_dalek::SigningKey::generate(&mut csprng),
        }
    }

    /// Create a keypair from 32-byte secret key material.
    pub fn from_secret_bytes(bytes: [u8; 32]) -> Self {
        Self {
            signing_key: ed25519_dalek::SigningKey::from_bytes(&bytes),
        }
    }

    /// Derive the public key from this keypair.
    pub fn public_key(&self) -> PublicKey {
        PublicKey {
            verifying_key: self.signing_key.verifying_key(),
        }
    }

    /// Sign a message, returning the raw 64-byte Ed25519 signature.
    ///
    /// Ed25519 signing is deterministic: the same key and message always
    /// produce the same signature, so solvers vary the proof input (and
    /// thereby the message) to search for a qualifying proof.
    pub fn sign(&self, message: &[u8]) -> Signature {
        Signature(self.signing_key.sign(message).to_bytes())
    }
}

impl fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyPair")
            .field("public_key", &self.public_key())
            .finish_non_exhaustive()
    }
}

/// Ed25519 public key: a solver's on-ledger identity.
#[derive(Clone)]
pub struct PublicKey {
    verifying_key: ed25519_dalek::VerifyingKey,
}

impl PublicKey {
    /// Create a public key from raw bytes (32 bytes).
    pub fn from_bytes(bytes: &[u8; 32]) -> Result<Self, CryptoError> {
        let vk = ed25519_dalek::VerifyingKey::from_bytes(bytes)
            .map_err(|_| CryptoError::InvalidPublicKey)?;
        Ok(Self { verifying_key: vk })
    }

    /// Get the raw public key bytes (32 bytes).
    pub fn to_bytes(&self) -> [u8; 32] {
        self.verifying_key.to_bytes()
    }

    /// The account id: BLAKE3 hash of the raw public key bytes.
    ///
    /// Requests record this hash as the initializer, and fulfillment
    /// rewards are paid to the fulfilling caller's account id.
    pub fn account_id(&self) -> Hash256 {
        account_id(&self.to_bytes())
    }

    /// Verify an Ed25519 signature on a message.
    pub fn verify(&self, message: &[u8], signature: &Signature) -> Result<(), CryptoError> {
        let sig = ed25519_dalek::Signature::from_bytes(signature.as_bytes());
        self.verifying_key
            .verify(message, &sig)
            .map_err(|_| CryptoError::VerificationFailed)
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PublicKey({})", hex::encode(self.to_bytes()))
    }
}

impl fmt::Display for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.to_bytes()))
    }
}

impl PartialEq for PublicKey {
    fn eq(&self, other: &Self) -> bool {
        self.to_bytes() == other.to_bytes()
    }
}

impl Eq for PublicKey {}

impl std::hash::Hash for PublicKey {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.to_bytes().hash(state);
    }
}

impl Serialize for PublicKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_bytes().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for PublicKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let bytes = <[u8; 32]>::deserialize(deserializer)?;
        Self::from_bytes(&bytes).map_err(serde::de::Error::custom)
    }
}

/// Compute the account id (BLAKE3 hash) from raw public key bytes.
pub fn account_id(pubkey_bytes: &[u8; 32]) -> Hash256 {
    Hash256(blake3::hash(pubkey_bytes).into())
}

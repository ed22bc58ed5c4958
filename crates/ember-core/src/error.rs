//! Error types for the Ember beacon.
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RequestError {
    #[error("invalid request count: {0}")] InvalidRequestCount(u64),
    #[error("reward too low: {offered} per id, floor {floor}")] RewardTooLow { offered: u64, floor: u64 },
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FulfillError {
    #[error("empty batch")] EmptyBatch,
    #[error("length mismatch: {ids} ids, {proofs} proof inputs, {sigs} signatures")] LengthMismatch { ids: usize, proofs: usize, sigs: usize },
    #[error("indirect caller rejected")] IndirectCallerRejected,
    #[error("request not found: {0}")] RequestNotFound(u64),
    #[error("already fulfilled: {0}")] AlreadyFulfilled(u64),
    #[error("chain gap: predecessor of {0} unfulfilled")] ChainGap(u64),
    #[error("invalid signature for id {0}")] InvalidSignature(u64),
    #[error("proof too weak for id {id}: remainder {remainder}")] ProofTooWeak { id: u64, remainder: u64 },
    #[error("payout: {0}")] Payout(#[from] PayoutError),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PayoutError {
    #[error("transfer failed: {0}")] TransferFailed(String),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CryptoError {
    #[error("invalid public key bytes")] InvalidPublicKey,
    #[error("invalid signature bytes")] InvalidSignature,
    #[error("signature verification failed")] VerificationFailed,
}

#[derive(Error, Debug)]
pub enum EmberError {
    #[error(transparent)] Request(#[from] RequestError),
    #[error(transparent)] Fulfill(#[from] FulfillError),
    #[error(transparent)] Crypto(#[from] CryptoError),
}

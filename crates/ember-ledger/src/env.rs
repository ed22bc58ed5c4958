//! Chain-context environment capability.
//!
//! Block-native primitives (block number, gas price, block hashes,
//! timestamps) are modeled as an injected collaborator rather than
//! reimplemented. Hosts embedding the ledger in a chain runtime implement
//! [`ChainEnv`] over their native context; tests and single-process hosts
//! use [`FixedChainEnv`].

use std::sync::atomic::{AtomicU64, Ordering};

use ember_core::types::{ChainSnapshot, Hash256};

/// Read-only view of the host chain's native context.
pub trait ChainEnv: Send + Sync {
    /// Current block number.
    fn current_block_number(&self) -> u64;

    /// Gas price of the current call.
    fn current_gas_price(&self) -> u64;

    /// Hash of the previous block.
    fn previous_block_hash(&self) -> Hash256;

    /// Block difficulty / randomness-beacon field of the current block.
    fn block_entropy(&self) -> Hash256;

    /// Current block timestamp (Unix seconds).
    fn now(&self) -> u64;

    /// Capture all context fields at one instant.
    fn snapshot(&self) -> ChainSnapshot {
        ChainSnapshot {
            block_number: self.current_block_number(),
            gas_price: self.current_gas_price(),
            timestamp: self.now(),
            prev_block_hash: self.previous_block_hash(),
            block_entropy: self.block_entropy(),
        }
    }
}

/// Deterministic chain environment for tests and single-process hosts.
///
/// Numeric fields are settable through shared references (the ledger holds
/// the env behind an `Arc`); block hashes are derived from the block
/// number, so advancing the block yields fresh but reproducible hashes.
pub struct FixedChainEnv {
    block_number: AtomicU64,
    gas_price: AtomicU64,
    timestamp: AtomicU64,
}

impl FixedChainEnv {
    /// Create an environment positioned at the given block.
    pub fn new(block_number: u64, gas_price: u64, timestamp: u64) -> Self {
        Self {
            block_number: AtomicU64::new(block_number),
            gas_price: AtomicU64::new(gas_price),
            timestamp: AtomicU64::new(timestamp),
        }
    }

    /// Move to an absolute block number.
    pub fn set_block_number(&self, block_number: u64) {
        self.block_number.store(block_number, Ordering::Relaxed);
    }

    /// Advance by `blocks`, bumping the timestamp 12 seconds per block.
    pub fn advance_blocks(&self, blocks: u64) {
        self.block_number.fetch_add(blocks, Ordering::Relaxed);
        self.timestamp.fetch_add(blocks * 12, Ordering::Relaxed);
    }

    /// Set the gas price reported for subsequent calls.
    pub fn set_gas_price(&self, gas_price: u64) {
        self.gas_price.store(gas_price, Ordering::Relaxed);
    }

    /// Set the reported timestamp.
    pub fn set_timestamp(&self, timestamp: u64) {
        self.timestamp.store(timestamp, Ordering::Relaxed);
    }
}

impl Default for FixedChainEnv {
    fn default() -> Self {
        Self::new(1, 1, 1_700_000_000)
    }
}

impl ChainEnv for FixedChainEnv {
    fn current_block_number(&self) -> u64 {
        self.block_number.load(Ordering::Relaxed)
    }

    fn current_gas_price(&self) -> u64 {
        self.gas_price.load(Ordering::Relaxed)
    }

    fn previous_block_hash(&self) -> Hash256 {
        synthetic_block_hash(self.current_block_number().saturating_sub(1))
    }

    fn block_entropy(&self) -> Hash256 {
        let mut data = Vec::with_capacity(16);
        data.extend_from_slice(b"entropy:");
        data.extend_from_slice(&self.current_block_number().to_le_bytes());
        Hash256(blake3::hash(&data).into())
    }

    fn now(&self) -> u64 {
        self.timestamp.load(Ordering::Relaxed)
    }
}

/// Reproducible stand-in hash for the block at `block_number`.
pub fn synthetic_block_hash(block_number: u64) -> Hash256 {
    let mut data = Vec::with_capacity(14);
    data.extend_from_slice(b"block:");
    data.extend_from_slice(&block_number.to_le_bytes());
    Hash256(blake3::hash(&data).into())
}

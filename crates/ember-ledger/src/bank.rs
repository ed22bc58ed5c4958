//! Reward payout capability.
//!
//! The ledger escrows per-request rewards as bookkeeping entries and pays
//! the pooled total out through [`RewardBank`] in one transfer per accepted
//! fulfillment batch. Payment is strictly paired with the state transition:
//! the ledger pays before committing, so a failed transfer leaves no
//! visible effect and no error is retried internally.

use std::collections::HashMap;

use ember_core::error::PayoutError;
use ember_core::types::Hash256;

/// Moves reward funds to a fulfilling solver's account.
pub trait RewardBank: Send + Sync {
    /// Transfer `amount` to the account `to`. All-or-nothing: an `Err`
    /// means no funds moved.
    fn pay(&mut self, to: &Hash256, amount: u64) -> Result<(), PayoutError>;
}

/// In-memory bank for tests and single-process hosts.
///
/// Accumulates payments per account; no persistence.
#[derive(Default)]
pub struct MemoryBank {
    balances: HashMap<Hash256, u64>,
}

impl MemoryBank {
    /// Create an empty bank.
    pub fn new() -> Self {
        Self::default()
    }

    /// Balance accumulated for an account.
    pub fn balance(&self, account: &Hash256) -> u64 {
        self.balances.get(account).copied().unwrap_or(0)
    }
}

impl RewardBank for MemoryBank {
    fn pay(&mut self, to: &Hash256, amount: u64) -> Result<(), PayoutError> {
        let balance = self.balances.entry(*to).or_insert(0);
        *balance = balance
            .checked_add(amount)
            .ok_or_else(|| PayoutError::TransferFailed("balance overflow".into()))?;
        Ok(())
    }
}

//! Difficulty control for the signature proof-of-work gate.
//!
//! The ledger retunes difficulty once per new block that contains a
//! fulfillment, from a single measurement window: how many fulfillments
//! landed in the previous active block versus how many blocks have elapsed
//! since. This is a reactive loop, not a predictive one: it oscillates
//! under bursty load, and no smoothing is applied.
//!
//! # Difficulty semantics
//!
//! Difficulty is a divisor threshold: a fulfillment is accepted only when
//! the big-endian integer value of its signature is divisible by the
//! current difficulty, so a difficulty of `d` costs a solver `d` expected
//! signing attempts per fulfillment.

use crate::constants::{INITIAL_DIFFICULTY, MIN_DIFFICULTY};

/// Compute the next difficulty from the previous measurement window.
///
/// `prev_block_fulfillments` is the number of fulfillments recorded in the
/// previous active block; `block_delta` the number of blocks elapsed since
/// that block; `current` the difficulty in force.
///
/// Returns `current` unchanged when `block_delta == 0` (the engine only
/// invokes this at a real block boundary; the guard keeps the function
/// total). When fulfillments averaged slower than one per block
/// (`block_delta > prev_block_fulfillments`) the difficulty resets to the
/// [`MIN_DIFFICULTY`] floor. Otherwise:
///
/// `INITIAL_DIFFICULTY * prev_block_fulfillments / block_delta`
///
/// with the multiplication performed before the division (in u128) to
/// avoid truncation loss, saturated into u64.
pub fn next_difficulty(prev_block_fulfillments: u64, block_delta: u64, current: u64) -> u64 {
    if block_delta == 0 {
        return current;
    }
    if block_delta > prev_block_fulfillments {
        return MIN_DIFFICULTY;
    }

    let scaled = (INITIAL_DIFFICULTY as u128).saturating_mul(prev_block_fulfillments as u128)
        / (block_delta as u128);
    scaled.min(u64::MAX as u128) as u64
}

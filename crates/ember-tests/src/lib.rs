//! End-to-end and adversarial test suite for the Ember beacon.
//!
//! This crate contains integration tests that exercise the full
//! request/solve/fulfill lifecycle and that attempt to break the ledger
//! from an attacker's perspective: stolen proofs, relayed calls,
//! out-of-order fulfillment, and payout failures.

pub mod helpers;

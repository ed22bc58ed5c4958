//! # ember-ledger
//! The Randomness Ledger: request intake, fulfillment engine, and
//! incentive accounting for the Ember beacon.
//!
//! The ledger assumes a serializing host: every state-mutating operation
//! is one atomic unit relative to all others, and no internal locking is
//! introduced. Chain-native context (block number, gas price, block
//! hashes) is injected through the [`env::ChainEnv`] capability; reward
//! movement goes through the [`bank::RewardBank`] capability.

pub mod bank;
pub mod env;
pub mod events;
pub mod ledger;
pub mod solver;

pub use ember_core::codec::convert_signatures;

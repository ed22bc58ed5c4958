//! Shared test helpers for E2E and adversarial tests.

use std::sync::Arc;

use ember_core::crypto::KeyPair;
use ember_core::error::{FulfillError, PayoutError};
use ember_core::types::{Hash256, RequestId, Signature};
use ember_ledger::bank::RewardBank;
use ember_ledger::env::FixedChainEnv;
use ember_ledger::ledger::{CallOrigin, RandomnessLedger};
use ember_ledger::solver::search_proof;

/// Simple account hash from a seed byte.
pub fn account(seed: u8) -> Hash256 {
    Hash256([seed; 32])
}

/// Deterministic solver keypair from a seed byte.
pub fn solver(seed: u8) -> KeyPair {
    KeyPair::from_secret_bytes([seed; 32])
}

/// A beacon at block 100 with the given starting difficulty.
pub fn test_ledger(difficulty: u64) -> (RandomnessLedger, Arc<FixedChainEnv>) {
    let env = Arc::new(FixedChainEnv::new(100, 5, 1_700_000_000));
    let ledger = RandomnessLedger::new(7, &account(0xA1), account(0xEE), env.clone())
        .with_difficulty(difficulty);
    (ledger, env)
}

/// Grind a proof for `id` against the ledger's current state and submit it
/// as a single-element batch from `kp`.
pub fn solve_one(
    ledger: &mut RandomnessLedger,
    kp: &KeyPair,
    id: RequestId,
    bank: &mut dyn RewardBank,
) -> Result<(), FulfillError> {
    let predecessor = ledger
        .random_result(id - 1)
        .unwrap_or(Hash256::ZERO);
    let (proof_input, sig) = search_proof(kp, &predecessor, ledger.difficulty(), 10_000_000)
        .expect("proof search budget exhausted");
    let origin = CallOrigin::direct(kp.public_key());
    ledger.fulfill_randomness(&origin, &[id], &[proof_input], &[sig], bank)
}

/// Sign the canonical message for `id` with the ledger's current
/// predecessor value, without any proof-of-work search. Only passes the
/// gate at difficulty 1.
pub fn sign_for(ledger: &RandomnessLedger, kp: &KeyPair, id: RequestId, proof_input: u64) -> Signature {
    let message = ledger.message_hash(id, proof_input);
    kp.sign(message.as_bytes())
}

/// Bank that refuses every transfer, for rollback tests.
pub struct RefusingBank;

impl RewardBank for RefusingBank {
    fn pay(&mut self, _to: &Hash256, _amount: u64) -> Result<(), PayoutError> {
        Err(PayoutError::TransferFailed("host refused transfer".into()))
    }
}

//! The Randomness Ledger state machine.
//!
//! Owns all mapping-backed beacon state and implements the boundary
//! operations: request intake, batch fulfillment, and the read-only
//! surface. Callers are identified by Ed25519 public keys; their account
//! id (BLAKE3 pubkey hash) routes reward payouts.
//!
//! # Atomicity
//!
//! Each operation is all-or-nothing. Fulfillment validates the entire
//! batch into a staging overlay, pays the pooled reward, and only then
//! commits; any per-id failure or a failed transfer leaves the ledger
//! exactly as it was. The host must serialize calls; the ledger holds no
//! locks of its own.

use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info};

use ember_core::codec;
use ember_core::constants::{INITIAL_DIFFICULTY, MIN_REWARD};
use ember_core::crypto::PublicKey;
use ember_core::difficulty;
use ember_core::error::{FulfillError, PayoutError, RequestError};
use ember_core::types::{Hash256, Request, RequestId, Signature};

use crate::bank::RewardBank;
use crate::env::ChainEnv;
use crate::events::LedgerEvent;

/// How a call reached the ledger.
///
/// Fulfillment is restricted to direct callers: a relayed call could carry
/// someone else's solved proof, but the signature check alone already binds
/// the proof to the payout account, and rejecting relays keeps the caller
/// identity and the transaction origin the same actor.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OriginKind {
    /// Externally-originated call, straight from the keyholder.
    Direct,
    /// Forwarded through an intermediary.
    Relayed,
}

/// Identity and provenance of the caller of a fulfillment.
#[derive(Clone, Debug)]
pub struct CallOrigin {
    /// The caller's public key; proofs must verify under it.
    pub public_key: PublicKey,
    /// Whether the call came straight from the keyholder.
    pub kind: OriginKind,
}

impl CallOrigin {
    /// A direct call from the holder of `public_key`.
    pub fn direct(public_key: PublicKey) -> Self {
        Self { public_key, kind: OriginKind::Direct }
    }

    /// A call forwarded through an intermediary.
    pub fn relayed(public_key: PublicKey) -> Self {
        Self { public_key, kind: OriginKind::Relayed }
    }

    /// The caller's account id (payout destination).
    pub fn account(&self) -> Hash256 {
        self.public_key.account_id()
    }

    fn is_direct(&self) -> bool {
        self.kind == OriginKind::Direct
    }
}

/// The incentivized chained-randomness ledger.
///
/// Construction seeds the id-0 random value; every later value is chained
/// to its predecessor by a solver-submitted fulfillment gated on a
/// signature proof-of-work. Requests escrow rewards which are paid to the
/// fulfilling caller.
pub struct RandomnessLedger {
    env: Arc<dyn ChainEnv>,
    /// Identity of this beacon instance, mixed into every random value so
    /// distinct deployments produce distinct ladders.
    address: Hash256,
    /// Fulfilled random values by id. Absent means unfulfilled.
    results: HashMap<RequestId, Hash256>,
    /// Request bookkeeping by id. Entries are never deleted; rewards are
    /// zeroed once paid.
    requests: HashMap<RequestId, Request>,
    /// Fulfillment count per block number.
    block_fulfillments: HashMap<u64, u64>,
    /// Next id to assign. Starts at 1; slot 0 is the genesis value.
    next_request_id: RequestId,
    /// Highest fulfilled id.
    latest_fulfill_id: RequestId,
    /// Current proof-of-work divisor.
    difficulty: u64,
    /// Block in which the difficulty was last retuned.
    latest_fulfillment_block: u64,
    events: Vec<LedgerEvent>,
}

impl RandomnessLedger {
    /// One-time initialization of a beacon instance.
    ///
    /// Seeds the id-0 random value from the caller-supplied `seed`, the
    /// caller's account id, chain-context entropy, and the beacon address.
    pub fn new(seed: u64, caller: &Hash256, address: Hash256, env: Arc<dyn ChainEnv>) -> Self {
        let snapshot = env.snapshot();
        let genesis = codec::genesis_value(seed, caller, &snapshot, &address);
        let mut results = HashMap::new();
        results.insert(0, genesis);
        info!(
            block = snapshot.block_number,
            genesis = %genesis,
            "randomness ledger initialized"
        );
        Self {
            env,
            address,
            results,
            requests: HashMap::new(),
            block_fulfillments: HashMap::new(),
            next_request_id: 1,
            latest_fulfill_id: 0,
            difficulty: INITIAL_DIFFICULTY,
            latest_fulfillment_block: snapshot.block_number,
            events: Vec::new(),
        }
    }

    /// Override the starting difficulty.
    ///
    /// Intended for test suites that need cheap proofs (difficulty 1
    /// accepts any signature) without grinding real ones.
    #[cfg(any(test, feature = "testing"))]
    pub fn with_difficulty(mut self, difficulty: u64) -> Self {
        self.difficulty = difficulty;
        self
    }

    // ------------------------------------------------------------------
    // Request intake
    // ------------------------------------------------------------------

    /// Accept a batch request with an attached reward pool.
    ///
    /// Splits `value` evenly over `count` sub-requests (integer division;
    /// any remainder is dropped, matching the historical behavior) and
    /// allocates `count` consecutive ids. No randomness is generated here,
    /// only bookkeeping and reward escrow.
    ///
    /// # Errors
    ///
    /// - [`RequestError::InvalidRequestCount`] when `count < 1`
    /// - [`RequestError::RewardTooLow`] when `value / count < MIN_REWARD`
    pub fn request_random(
        &mut self,
        caller: &Hash256,
        count: u64,
        value: u64,
    ) -> Result<Vec<RequestId>, RequestError> {
        if count < 1 {
            return Err(RequestError::InvalidRequestCount(count));
        }
        let reward = value / count;
        if reward < MIN_REWARD {
            return Err(RequestError::RewardTooLow { offered: reward, floor: MIN_REWARD });
        }

        let first = self.next_request_id;
        // Id-space exhaustion is unreachable with a u64 counter, but wrap
        // silently never.
        let next = first
            .checked_add(count)
            .ok_or(RequestError::InvalidRequestCount(count))?;

        for id in first..next {
            self.requests.insert(id, Request { initializer: *caller, reward });
            self.events.push(LedgerEvent::RandomRequested { id });
        }
        self.next_request_id = next;
        debug!(first, count, reward, "random requests recorded");
        Ok((first..next).collect())
    }

    // ------------------------------------------------------------------
    // Fulfillment engine
    // ------------------------------------------------------------------

    /// Validate and record a batch of fulfillments, paying the pooled
    /// reward to the caller.
    ///
    /// `ids`, `proof_inputs`, and `signatures` are parallel arrays. Ids
    /// may chain within the batch (`[n, n + 1]` validates against the
    /// staged value of `n`). The whole call fails atomically if any
    /// element fails validation or the payout transfer fails.
    ///
    /// # Errors
    ///
    /// [`FulfillError`] for the failing condition; on error no state
    /// changed and no payment occurred.
    pub fn fulfill_randomness(
        &mut self,
        origin: &CallOrigin,
        ids: &[RequestId],
        proof_inputs: &[u64],
        signatures: &[Signature],
        bank: &mut dyn RewardBank,
    ) -> Result<(), FulfillError> {
        if !origin.is_direct() {
            return Err(FulfillError::IndirectCallerRejected);
        }
        if ids.is_empty() {
            return Err(FulfillError::EmptyBatch);
        }
        if ids.len() != proof_inputs.len() || ids.len() != signatures.len() {
            return Err(FulfillError::LengthMismatch {
                ids: ids.len(),
                proofs: proof_inputs.len(),
                sigs: signatures.len(),
            });
        }

        let snapshot = self.env.snapshot();

        // Stage the whole batch before touching any state.
        let mut staged: Vec<(RequestId, Hash256)> = Vec::with_capacity(ids.len());
        let mut staged_values: HashMap<RequestId, Hash256> = HashMap::new();
        let mut total_reward: u64 = 0;

        for ((&id, &proof_input), signature) in
            ids.iter().zip(proof_inputs.iter()).zip(signatures.iter())
        {
            let request = *self
                .requests
                .get(&id)
                .ok_or(FulfillError::RequestNotFound(id))?;
            if self.results.contains_key(&id) || staged_values.contains_key(&id) {
                return Err(FulfillError::AlreadyFulfilled(id));
            }

            // Ids are assigned from 1 upward, so id - 1 always exists as a
            // slot; it just may not be fulfilled yet.
            let predecessor = staged_values
                .get(&(id - 1))
                .or_else(|| self.results.get(&(id - 1)))
                .copied()
                .ok_or(FulfillError::ChainGap(id))?;

            let message = codec::message_hash(&predecessor, proof_input);
            origin
                .public_key
                .verify(message.as_bytes(), signature)
                .map_err(|_| FulfillError::InvalidSignature(id))?;

            let remainder = codec::signature_integer(signature).rem(self.difficulty);
            if remainder != 0 {
                return Err(FulfillError::ProofTooWeak { id, remainder });
            }

            let value = codec::fulfillment_value(
                proof_input,
                &predecessor,
                &request.initializer,
                &snapshot,
                &self.address,
            );
            staged_values.insert(id, value);
            staged.push((id, value));
            total_reward = total_reward
                .checked_add(request.reward)
                .ok_or_else(|| PayoutError::TransferFailed("reward pool overflow".into()))?;
        }

        // Payment precedes the commit so a failed transfer rolls the whole
        // call back by never applying it.
        let payee = origin.account();
        bank.pay(&payee, total_reward)?;

        for &(id, value) in &staged {
            self.results.insert(id, value);
            if let Some(request) = self.requests.get_mut(&id) {
                request.reward = 0;
            }
            if id > self.latest_fulfill_id {
                self.latest_fulfill_id = id;
            }
            self.events.push(LedgerEvent::RandomFulfilled { id, value });
            debug!(id, value = %value, "fulfillment recorded");
        }
        info!(
            batch = ids.len(),
            reward = total_reward,
            payee = %payee,
            block = snapshot.block_number,
            "fulfillment batch accepted"
        );

        let block = snapshot.block_number;
        *self.block_fulfillments.entry(block).or_insert(0) += ids.len() as u64;
        if block > self.latest_fulfillment_block {
            let delta = block - self.latest_fulfillment_block;
            let prev = self
                .block_fulfillments
                .get(&self.latest_fulfillment_block)
                .copied()
                .unwrap_or(0);
            let retuned = difficulty::next_difficulty(prev, delta, self.difficulty);
            debug!(prev, delta, old = self.difficulty, new = retuned, "difficulty retuned");
            self.difficulty = retuned;
            self.latest_fulfillment_block = block;
        }

        Ok(())
    }

    // ------------------------------------------------------------------
    // Read-only surface
    // ------------------------------------------------------------------

    /// The canonical message a solver must sign to fulfill `id` with
    /// `proof_input`. Uses the zero hash while the predecessor is
    /// unfulfilled (and for id 0).
    pub fn message_hash(&self, id: RequestId, proof_input: u64) -> Hash256 {
        let predecessor = if id == 0 {
            Hash256::ZERO
        } else {
            self.results.get(&(id - 1)).copied().unwrap_or(Hash256::ZERO)
        };
        codec::message_hash(&predecessor, proof_input)
    }

    /// The next request id the counter will assign.
    pub fn current_request_id(&self) -> RequestId {
        self.next_request_id
    }

    /// Highest fulfilled id (0 right after construction).
    pub fn latest_fulfill_id(&self) -> RequestId {
        self.latest_fulfill_id
    }

    /// The proof-of-work divisor currently in force.
    pub fn difficulty(&self) -> u64 {
        self.difficulty
    }

    /// The random value at `id`, if fulfilled.
    pub fn random_result(&self, id: RequestId) -> Option<Hash256> {
        self.results.get(&id).copied()
    }

    /// Full bookkeeping entry for a request id.
    pub fn request(&self, id: RequestId) -> Option<Request> {
        self.requests.get(&id).copied()
    }

    /// Account id that initialized `id`.
    pub fn request_initializer(&self, id: RequestId) -> Option<Hash256> {
        self.requests.get(&id).map(|r| r.initializer)
    }

    /// Escrowed reward for `id` (zero once paid).
    pub fn reward(&self, id: RequestId) -> Option<u64> {
        self.requests.get(&id).map(|r| r.reward)
    }

    /// Number of fulfillments recorded in `block`.
    pub fn block_fulfillments(&self, block: u64) -> u64 {
        self.block_fulfillments.get(&block).copied().unwrap_or(0)
    }

    /// Block in which the difficulty was last retuned.
    pub fn latest_fulfillment_block(&self) -> u64 {
        self.latest_fulfillment_block
    }

    /// Identity of this beacon instance.
    pub fn beacon_address(&self) -> Hash256 {
        self.address
    }

    /// Hand accumulated notifications to the host, clearing the log.
    pub fn drain_events(&mut self) -> Vec<LedgerEvent> {
        std::mem::take(&mut self.events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bank::MemoryBank;
    use crate::env::FixedChainEnv;
    use crate::solver::search_proof;
    use ember_core::constants::{MIN_DIFFICULTY, MIN_REWARD};
    use ember_core::crypto::KeyPair;

    fn requester() -> Hash256 {
        Hash256([0xA1; 32])
    }

    fn test_ledger(difficulty: u64) -> (RandomnessLedger, Arc<FixedChainEnv>) {
        let env = Arc::new(FixedChainEnv::new(100, 5, 1_700_000_000));
        let ledger = RandomnessLedger::new(7, &requester(), Hash256([0xEE; 32]), env.clone())
            .with_difficulty(difficulty);
        (ledger, env)
    }

    /// Grind a proof for a single id and submit it.
    fn fulfill(
        ledger: &mut RandomnessLedger,
        kp: &KeyPair,
        ids: &[RequestId],
        bank: &mut MemoryBank,
    ) -> Result<(), FulfillError> {
        assert_eq!(ids.len(), 1, "helper handles one id at a time");
        let id = ids[0];
        let predecessor = ledger.random_result(id.wrapping_sub(1)).unwrap_or(Hash256::ZERO);
        let (proof_input, sig) = search_proof(kp, &predecessor, ledger.difficulty(), 1_000_000)
            .expect("proof search exhausted");
        let origin = CallOrigin::direct(kp.public_key());
        ledger.fulfill_randomness(&origin, ids, &[proof_input], &[sig], bank)
    }

    // ------------------------------------------------------------------
    // Construction
    // ------------------------------------------------------------------

    #[test]
    fn construction_seeds_genesis() {
        let (ledger, _env) = test_ledger(INITIAL_DIFFICULTY);
        let genesis = ledger.random_result(0).unwrap();
        assert!(!genesis.is_zero());
        assert_eq!(ledger.current_request_id(), 1);
        assert_eq!(ledger.latest_fulfill_id(), 0);
        assert_eq!(ledger.latest_fulfillment_block(), 100);
    }

    #[test]
    fn genesis_deterministic_for_fixed_context() {
        let env = Arc::new(FixedChainEnv::new(100, 5, 1_700_000_000));
        let a = RandomnessLedger::new(7, &requester(), Hash256([0xEE; 32]), env.clone());
        let b = RandomnessLedger::new(7, &requester(), Hash256([0xEE; 32]), env);
        assert_eq!(a.random_result(0), b.random_result(0));
    }

    #[test]
    fn genesis_differs_per_seed_and_address() {
        let env = Arc::new(FixedChainEnv::new(100, 5, 1_700_000_000));
        let a = RandomnessLedger::new(7, &requester(), Hash256([0xEE; 32]), env.clone());
        let b = RandomnessLedger::new(8, &requester(), Hash256([0xEE; 32]), env.clone());
        let c = RandomnessLedger::new(7, &requester(), Hash256([0xDD; 32]), env);
        assert_ne!(a.random_result(0), b.random_result(0));
        assert_ne!(a.random_result(0), c.random_result(0));
    }

    // ------------------------------------------------------------------
    // Request intake
    // ------------------------------------------------------------------

    #[test]
    fn request_assigns_consecutive_ids() {
        let (mut ledger, _env) = test_ledger(INITIAL_DIFFICULTY);
        let ids = ledger.request_random(&requester(), 3, 3 * MIN_REWARD).unwrap();
        assert_eq!(ids, vec![1, 2, 3]);
        assert_eq!(ledger.current_request_id(), 4);

        let more = ledger.request_random(&requester(), 2, 2 * MIN_REWARD).unwrap();
        assert_eq!(more, vec![4, 5]);
        assert_eq!(ledger.current_request_id(), 6);
    }

    #[test]
    fn request_splits_reward_evenly() {
        let (mut ledger, _env) = test_ledger(INITIAL_DIFFICULTY);
        let ids = ledger.request_random(&requester(), 3, 3 * MIN_REWARD).unwrap();
        for id in ids {
            assert_eq!(ledger.reward(id), Some(MIN_REWARD));
            assert_eq!(ledger.request_initializer(id), Some(requester()));
        }
    }

    #[test]
    fn request_drops_uneven_remainder() {
        let (mut ledger, _env) = test_ledger(INITIAL_DIFFICULTY);
        // 2 * MIN_REWARD + 1 over 2 ids: the odd unit vanishes.
        let ids = ledger
            .request_random(&requester(), 2, 2 * MIN_REWARD + 1)
            .unwrap();
        assert_eq!(ledger.reward(ids[0]), Some(MIN_REWARD));
        assert_eq!(ledger.reward(ids[1]), Some(MIN_REWARD));
    }

    #[test]
    fn request_zero_count_rejected() {
        let (mut ledger, _env) = test_ledger(INITIAL_DIFFICULTY);
        assert_eq!(
            ledger.request_random(&requester(), 0, 1_000_000).unwrap_err(),
            RequestError::InvalidRequestCount(0)
        );
        assert_eq!(ledger.current_request_id(), 1);
    }

    #[test]
    fn request_below_floor_rejected() {
        let (mut ledger, _env) = test_ledger(INITIAL_DIFFICULTY);
        let err = ledger
            .request_random(&requester(), 2, 2 * MIN_REWARD - 1)
            .unwrap_err();
        assert_eq!(
            err,
            RequestError::RewardTooLow { offered: MIN_REWARD - 1, floor: MIN_REWARD }
        );
        assert_eq!(ledger.current_request_id(), 1);
        assert!(ledger.drain_events().is_empty());
    }

    #[test]
    fn request_emits_one_event_per_id() {
        let (mut ledger, _env) = test_ledger(INITIAL_DIFFICULTY);
        ledger.request_random(&requester(), 2, 2 * MIN_REWARD).unwrap();
        assert_eq!(
            ledger.drain_events(),
            vec![
                LedgerEvent::RandomRequested { id: 1 },
                LedgerEvent::RandomRequested { id: 2 },
            ]
        );
        assert!(ledger.drain_events().is_empty());
    }

    // ------------------------------------------------------------------
    // Fulfillment: happy path
    // ------------------------------------------------------------------

    #[test]
    fn fulfill_single_id() {
        let (mut ledger, _env) = test_ledger(1);
        ledger.request_random(&requester(), 1, MIN_REWARD).unwrap();
        ledger.drain_events();

        let kp = KeyPair::from_secret_bytes([1; 32]);
        let mut bank = MemoryBank::new();
        fulfill(&mut ledger, &kp, &[1], &mut bank).unwrap();

        let value = ledger.random_result(1).unwrap();
        assert!(!value.is_zero());
        assert_eq!(ledger.latest_fulfill_id(), 1);
        assert_eq!(ledger.reward(1), Some(0));
        assert_eq!(bank.balance(&kp.public_key().account_id()), MIN_REWARD);
        assert_eq!(
            ledger.drain_events(),
            vec![LedgerEvent::RandomFulfilled { id: 1, value }]
        );
    }

    #[test]
    fn fulfill_batch_chains_within_batch() {
        let (mut ledger, _env) = test_ledger(1);
        ledger.request_random(&requester(), 3, 3 * MIN_REWARD).unwrap();

        // At difficulty 1 every signature qualifies, but each element must
        // still sign the message derived from its (staged) predecessor.
        let kp = KeyPair::from_secret_bytes([1; 32]);
        let env_snapshot = ledger.env.snapshot();
        let mut predecessor = ledger.random_result(0).unwrap();
        let mut proofs = Vec::new();
        let mut sigs = Vec::new();
        for id in 1u64..=3 {
            let message = codec::message_hash(&predecessor, id * 10);
            let sig = kp.sign(message.as_bytes());
            proofs.push(id * 10);
            sigs.push(sig);
            let request = ledger.request(id).unwrap();
            predecessor = codec::fulfillment_value(
                id * 10,
                &predecessor,
                &request.initializer,
                &env_snapshot,
                &ledger.beacon_address(),
            );
        }

        let origin = CallOrigin::direct(kp.public_key());
        let mut bank = MemoryBank::new();
        ledger
            .fulfill_randomness(&origin, &[1, 2, 3], &proofs, &sigs, &mut bank)
            .unwrap();

        assert_eq!(ledger.latest_fulfill_id(), 3);
        assert_eq!(bank.balance(&kp.public_key().account_id()), 3 * MIN_REWARD);
        assert_eq!(ledger.block_fulfillments(100), 3);
    }

    #[test]
    fn fulfilled_value_matches_codec() {
        let (mut ledger, env) = test_ledger(1);
        ledger.request_random(&requester(), 1, MIN_REWARD).unwrap();

        let kp = KeyPair::from_secret_bytes([1; 32]);
        let predecessor = ledger.random_result(0).unwrap();
        let message = codec::message_hash(&predecessor, 99);
        let sig = kp.sign(message.as_bytes());
        let origin = CallOrigin::direct(kp.public_key());
        let mut bank = MemoryBank::new();
        ledger
            .fulfill_randomness(&origin, &[1], &[99], &[sig], &mut bank)
            .unwrap();

        let expected = codec::fulfillment_value(
            99,
            &predecessor,
            &requester(),
            &env.snapshot(),
            &ledger.beacon_address(),
        );
        assert_eq!(ledger.random_result(1), Some(expected));
    }

    // ------------------------------------------------------------------
    // Fulfillment: rejections
    // ------------------------------------------------------------------

    #[test]
    fn fulfill_unknown_id_rejected() {
        let (mut ledger, _env) = test_ledger(1);
        let kp = KeyPair::from_secret_bytes([1; 32]);
        let mut bank = MemoryBank::new();
        let err = fulfill(&mut ledger, &kp, &[1], &mut bank).unwrap_err();
        assert_eq!(err, FulfillError::RequestNotFound(1));
    }

    #[test]
    fn fulfill_out_of_order_rejected() {
        let (mut ledger, _env) = test_ledger(1);
        ledger.request_random(&requester(), 2, 2 * MIN_REWARD).unwrap();

        let kp = KeyPair::from_secret_bytes([1; 32]);
        let message = ledger.message_hash(2, 5);
        let sig = kp.sign(message.as_bytes());
        let origin = CallOrigin::direct(kp.public_key());
        let mut bank = MemoryBank::new();
        let err = ledger
            .fulfill_randomness(&origin, &[2], &[5], &[sig], &mut bank)
            .unwrap_err();
        assert_eq!(err, FulfillError::ChainGap(2));
        assert_eq!(ledger.random_result(2), None);
        assert_eq!(bank.balance(&kp.public_key().account_id()), 0);
    }

    #[test]
    fn fulfill_twice_rejected_without_side_effects() {
        let (mut ledger, _env) = test_ledger(1);
        ledger.request_random(&requester(), 1, MIN_REWARD).unwrap();

        let kp = KeyPair::from_secret_bytes([1; 32]);
        let mut bank = MemoryBank::new();
        fulfill(&mut ledger, &kp, &[1], &mut bank).unwrap();
        let value = ledger.random_result(1).unwrap();
        ledger.drain_events();

        let err = fulfill(&mut ledger, &kp, &[1], &mut bank).unwrap_err();
        assert_eq!(err, FulfillError::AlreadyFulfilled(1));
        assert_eq!(ledger.random_result(1), Some(value));
        assert_eq!(bank.balance(&kp.public_key().account_id()), MIN_REWARD);
        assert!(ledger.drain_events().is_empty());
    }

    #[test]
    fn fulfill_duplicate_id_within_batch_rejected() {
        let (mut ledger, _env) = test_ledger(1);
        ledger.request_random(&requester(), 1, MIN_REWARD).unwrap();

        let kp = KeyPair::from_secret_bytes([1; 32]);
        let message = ledger.message_hash(1, 5);
        let sig = kp.sign(message.as_bytes());
        let origin = CallOrigin::direct(kp.public_key());
        let mut bank = MemoryBank::new();
        let err = ledger
            .fulfill_randomness(&origin, &[1, 1], &[5, 5], &[sig, sig], &mut bank)
            .unwrap_err();
        assert_eq!(err, FulfillError::AlreadyFulfilled(1));
        assert_eq!(ledger.random_result(1), None);
    }

    #[test]
    fn fulfill_relayed_caller_rejected() {
        let (mut ledger, _env) = test_ledger(1);
        ledger.request_random(&requester(), 1, MIN_REWARD).unwrap();

        let kp = KeyPair::from_secret_bytes([1; 32]);
        let message = ledger.message_hash(1, 5);
        let sig = kp.sign(message.as_bytes());
        let origin = CallOrigin::relayed(kp.public_key());
        let mut bank = MemoryBank::new();
        let err = ledger
            .fulfill_randomness(&origin, &[1], &[5], &[sig], &mut bank)
            .unwrap_err();
        assert_eq!(err, FulfillError::IndirectCallerRejected);
    }

    #[test]
    fn fulfill_empty_batch_rejected() {
        let (mut ledger, _env) = test_ledger(1);
        let kp = KeyPair::from_secret_bytes([1; 32]);
        let origin = CallOrigin::direct(kp.public_key());
        let mut bank = MemoryBank::new();
        let err = ledger
            .fulfill_randomness(&origin, &[], &[], &[], &mut bank)
            .unwrap_err();
        assert_eq!(err, FulfillError::EmptyBatch);
    }

    #[test]
    fn fulfill_length_mismatch_rejected() {
        let (mut ledger, _env) = test_ledger(1);
        ledger.request_random(&requester(), 1, MIN_REWARD).unwrap();

        let kp = KeyPair::from_secret_bytes([1; 32]);
        let sig = kp.sign(b"whatever");
        let origin = CallOrigin::direct(kp.public_key());
        let mut bank = MemoryBank::new();
        let err = ledger
            .fulfill_randomness(&origin, &[1], &[5, 6], &[sig], &mut bank)
            .unwrap_err();
        assert_eq!(err, FulfillError::LengthMismatch { ids: 1, proofs: 2, sigs: 1 });
    }

    #[test]
    fn fulfill_foreign_signature_rejected() {
        let (mut ledger, _env) = test_ledger(1);
        ledger.request_random(&requester(), 1, MIN_REWARD).unwrap();

        // The proof was solved (signed) by somebody else; copying it into
        // a call from a different caller must fail.
        let solver = KeyPair::from_secret_bytes([1; 32]);
        let thief = KeyPair::from_secret_bytes([2; 32]);
        let message = ledger.message_hash(1, 5);
        let sig = solver.sign(message.as_bytes());
        let origin = CallOrigin::direct(thief.public_key());
        let mut bank = MemoryBank::new();
        let err = ledger
            .fulfill_randomness(&origin, &[1], &[5], &[sig], &mut bank)
            .unwrap_err();
        assert_eq!(err, FulfillError::InvalidSignature(1));
        assert_eq!(bank.balance(&thief.public_key().account_id()), 0);
    }

    #[test]
    fn fulfill_weak_proof_rejected() {
        // At an astronomically large difficulty essentially no signature
        // passes the divisibility gate.
        let (mut ledger, _env) = test_ledger(u64::MAX);
        ledger.request_random(&requester(), 1, MIN_REWARD).unwrap();

        let kp = KeyPair::from_secret_bytes([1; 32]);
        let message = ledger.message_hash(1, 5);
        let sig = kp.sign(message.as_bytes());
        let origin = CallOrigin::direct(kp.public_key());
        let mut bank = MemoryBank::new();
        let err = ledger
            .fulfill_randomness(&origin, &[1], &[5], &[sig], &mut bank)
            .unwrap_err();
        assert!(matches!(err, FulfillError::ProofTooWeak { id: 1, .. }));
        assert_eq!(ledger.random_result(1), None);
    }

    #[test]
    fn fulfill_batch_is_atomic() {
        let (mut ledger, _env) = test_ledger(1);
        ledger.request_random(&requester(), 1, MIN_REWARD).unwrap();

        // Batch [1, 999]: id 1 is valid but 999 was never requested.
        let kp = KeyPair::from_secret_bytes([1; 32]);
        let m1 = ledger.message_hash(1, 5);
        let s1 = kp.sign(m1.as_bytes());
        let s2 = kp.sign(b"irrelevant");
        let origin = CallOrigin::direct(kp.public_key());
        let mut bank = MemoryBank::new();
        let err = ledger
            .fulfill_randomness(&origin, &[1, 999], &[5, 6], &[s1, s2], &mut bank)
            .unwrap_err();
        assert_eq!(err, FulfillError::RequestNotFound(999));

        // Nothing from the batch landed.
        assert_eq!(ledger.random_result(1), None);
        assert_eq!(ledger.reward(1), Some(MIN_REWARD));
        assert_eq!(ledger.latest_fulfill_id(), 0);
        assert_eq!(bank.balance(&kp.public_key().account_id()), 0);
        assert_eq!(ledger.block_fulfillments(100), 0);
    }

    #[test]
    fn fulfill_payout_failure_rolls_back() {
        struct FailingBank;
        impl RewardBank for FailingBank {
            fn pay(&mut self, _to: &Hash256, _amount: u64) -> Result<(), PayoutError> {
                Err(PayoutError::TransferFailed("host refused".into()))
            }
        }

        let (mut ledger, _env) = test_ledger(1);
        ledger.request_random(&requester(), 1, MIN_REWARD).unwrap();
        ledger.drain_events();

        let kp = KeyPair::from_secret_bytes([1; 32]);
        let message = ledger.message_hash(1, 5);
        let sig = kp.sign(message.as_bytes());
        let origin = CallOrigin::direct(kp.public_key());
        let err = ledger
            .fulfill_randomness(&origin, &[1], &[5], &[sig], &mut FailingBank)
            .unwrap_err();
        assert!(matches!(err, FulfillError::Payout(_)));

        assert_eq!(ledger.random_result(1), None);
        assert_eq!(ledger.reward(1), Some(MIN_REWARD));
        assert!(ledger.drain_events().is_empty());
        assert_eq!(ledger.block_fulfillments(100), 0);
    }

    // ------------------------------------------------------------------
    // Difficulty retuning at block boundaries
    // ------------------------------------------------------------------

    #[test]
    fn same_block_fulfillments_do_not_retune() {
        let (mut ledger, _env) = test_ledger(1);
        ledger.request_random(&requester(), 2, 2 * MIN_REWARD).unwrap();

        let kp = KeyPair::from_secret_bytes([1; 32]);
        let mut bank = MemoryBank::new();
        fulfill(&mut ledger, &kp, &[1], &mut bank).unwrap();
        fulfill(&mut ledger, &kp, &[2], &mut bank).unwrap();

        assert_eq!(ledger.difficulty(), 1);
        assert_eq!(ledger.block_fulfillments(100), 2);
        assert_eq!(ledger.latest_fulfillment_block(), 100);
    }

    #[test]
    fn slow_window_resets_to_floor() {
        let (mut ledger, env) = test_ledger(1);
        ledger.request_random(&requester(), 2, 2 * MIN_REWARD).unwrap();

        let kp = KeyPair::from_secret_bytes([1; 32]);
        let mut bank = MemoryBank::new();
        fulfill(&mut ledger, &kp, &[1], &mut bank).unwrap();

        // One fulfillment in block 100, then nothing for 5 blocks:
        // delta (5) > previous count (1) → floor.
        env.advance_blocks(5);
        fulfill(&mut ledger, &kp, &[2], &mut bank).unwrap();
        assert_eq!(ledger.difficulty(), MIN_DIFFICULTY);
        assert_eq!(ledger.latest_fulfillment_block(), 105);
    }

    #[test]
    fn fast_window_applies_formula() {
        let (mut ledger, env) = test_ledger(1);
        ledger.request_random(&requester(), 4, 4 * MIN_REWARD).unwrap();

        let kp = KeyPair::from_secret_bytes([1; 32]);
        let mut bank = MemoryBank::new();
        fulfill(&mut ledger, &kp, &[1], &mut bank).unwrap();
        fulfill(&mut ledger, &kp, &[2], &mut bank).unwrap();
        fulfill(&mut ledger, &kp, &[3], &mut bank).unwrap();

        // Three fulfillments in block 100, next lands in block 101:
        // delta (1) <= previous count (3) → INITIAL * 3 / 1.
        env.advance_blocks(1);
        fulfill(&mut ledger, &kp, &[4], &mut bank).unwrap();
        assert_eq!(ledger.difficulty(), INITIAL_DIFFICULTY * 3);
        assert_eq!(ledger.latest_fulfillment_block(), 101);
        assert_eq!(ledger.block_fulfillments(101), 1);
    }

    #[test]
    fn message_hash_uses_zero_for_unfulfilled_predecessor() {
        let (ledger, _env) = test_ledger(1);
        assert_eq!(
            ledger.message_hash(5, 7),
            codec::message_hash(&Hash256::ZERO, 7)
        );
        let genesis = ledger.random_result(0).unwrap();
        assert_eq!(ledger.message_hash(1, 7), codec::message_hash(&genesis, 7));
    }
}

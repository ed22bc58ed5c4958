//! Protocol constants. All monetary values are in base reward units.

/// Minimum per-id reward attached to a request.
///
/// `request_random` splits the attached value evenly over the batch; the
/// per-id share must be at least this floor or the whole request is rejected.
///
/// # Examples
///
/// ```
/// use ember_core::constants::MIN_REWARD;
/// assert!(MIN_REWARD > 0);
/// ```
pub const MIN_REWARD: u64 = 1_000;

/// Target time for one fulfillment to land, in seconds.
pub const EXPECTED_FULFILL_TIME_SECS: u64 = 15;

/// Estimated signing throughput of a single solver, in signatures per second.
///
/// Together with [`EXPECTED_FULFILL_TIME_SECS`] this sizes the initial
/// difficulty so that one solver at the estimated rate needs roughly the
/// target time per fulfillment.
pub const ESTIMATED_SIGS_PER_SEC: u64 = 1_000;

/// Difficulty the ledger starts at.
///
/// # Examples
///
/// ```
/// use ember_core::constants::*;
/// assert_eq!(INITIAL_DIFFICULTY, EXPECTED_FULFILL_TIME_SECS * ESTIMATED_SIGS_PER_SEC);
/// ```
pub const INITIAL_DIFFICULTY: u64 = EXPECTED_FULFILL_TIME_SECS * ESTIMATED_SIGS_PER_SEC;

/// Difficulty floor, applied when fulfillments arrive slower than one per
/// block on average. Never exceeds [`INITIAL_DIFFICULTY`].
pub const MIN_DIFFICULTY: u64 = 1_000;

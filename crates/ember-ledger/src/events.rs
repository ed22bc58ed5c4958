//! Ledger notifications.

use serde::{Deserialize, Serialize};

use ember_core::types::{Hash256, RequestId};

/// Notification appended to the ledger's event log.
///
/// One `RandomRequested` per id on intake; one `RandomFulfilled` per
/// accepted fulfillment. Hosts drain the log via
/// [`RandomnessLedger::drain_events`](crate::ledger::RandomnessLedger::drain_events).
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum LedgerEvent {
    /// A request id was allocated and its reward escrowed.
    RandomRequested { id: RequestId },
    /// A request id was fulfilled with the given random value.
    RandomFulfilled { id: RequestId, value: Hash256 },
}

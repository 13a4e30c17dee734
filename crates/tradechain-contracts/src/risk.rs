//! Payload sent to the external risk recalculation service.

use serde::{Deserialize, Serialize};

use crate::subject::SubjectRef;

/// Fire-and-forget request to rescore a counterparty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskRecalculationRequest {
    /// The counterparty whose score should be recalculated.
    pub subject_owner_id: String,
    /// Why, e.g. `"TRADE_DISPUTED on trade/T-88"`.
    pub trigger_reason: String,
    /// The chain whose append triggered the request.
    pub subject: SubjectRef,
    /// Sequence of the triggering entry.
    pub sequence: u64,
}

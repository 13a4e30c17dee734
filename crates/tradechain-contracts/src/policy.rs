//! Transition policy context and verdict types.
//!
//! The transition policy consumes a `TransitionContext` and produces a
//! `PolicyVerdict`. The ledger is deny-by-default: anything other than
//! `Allow` rejects the append before a single byte is written.

use serde::{Deserialize, Serialize};

use crate::{action::Action, subject::SubjectType};

/// State label of a subject whose chain is still empty.
pub const GENESIS_STATE: &str = "GENESIS";

/// The decision the policy emits for one proposed append.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PolicyVerdict {
    /// The action is valid in the current state and the role may perform it.
    Allow,

    /// The action is not valid in the subject's current lifecycle state.
    Deny {
        /// Human-readable explanation, surfaced verbatim to the caller.
        reason: String,
    },

    /// The lifecycle allows the action but the actor's role does not.
    Forbidden {
        /// Human-readable explanation.
        reason: String,
    },
}

/// Everything the policy needs to decide on an append.
///
/// Built by the chain builder from the request and a snapshot of the chain.
/// Plain strings and tags only, so policies stay independent of storage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransitionContext {
    pub subject_type: SubjectType,
    pub subject_id: String,
    /// The action being appended.
    pub action: Action,
    /// The acting principal, `None` for system entries.
    pub actor_id: Option<String>,
    /// The role the action is performed under (`"system"` without an actor).
    pub role: String,
    /// Lifecycle state label derived from the chain, `GENESIS` when empty.
    pub current_state: String,
    /// Action of the current tip, whatever kind it is.
    pub previous_action: Option<Action>,
    /// Number of entries currently in the chain.
    pub chain_length: u64,
}

impl TransitionContext {
    pub fn is_genesis(&self) -> bool {
        self.chain_length == 0
    }
}

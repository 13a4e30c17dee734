//! The immutable chain entry.
//!
//! A `ChainEntry` is sealed exactly once, by the chain builder, and is never
//! mutated afterwards. Fields are private and exposed read-only; outside
//! this crate an entry can only be obtained from the builder or by
//! deserializing a stored one. Deserialized entries are untrusted until the
//! verifier has re-derived their hashes from the stored fields.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use tradechain_contracts::{
    action::Action,
    error::LedgerResult,
    hash::Sha256Hash,
    policy::GENESIS_STATE,
    request::Metadata,
    subject::{ActorId, SubjectRef, SubjectType},
};

use crate::{
    encoding::{self, EntryFields},
    hasher::sha256,
};

/// One link in a subject's hash chain.
///
/// `entry_hash` commits to every other field, including `previous_hash`,
/// so editing any stored byte invalidates this entry's hash and the link
/// from its successor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainEntry {
    schema_version: u16,
    sequence: u64,
    subject_type: SubjectType,
    subject_id: String,
    action: Action,
    actor_id: Option<ActorId>,
    #[serde(default)]
    metadata: Metadata,
    created_at: DateTime<Utc>,
    previous_hash: Sha256Hash,
    entry_hash: Sha256Hash,
}

/// The unsealed parts of an entry, assembled by the builder.
pub(crate) struct Draft {
    pub subject: SubjectRef,
    pub sequence: u64,
    pub action: Action,
    pub actor_id: Option<ActorId>,
    pub metadata: Metadata,
    pub created_at: DateTime<Utc>,
    pub previous_hash: Sha256Hash,
}

impl ChainEntry {
    /// Compute the hash of `draft` and freeze it into an entry.
    pub(crate) fn seal(draft: Draft) -> LedgerResult<Self> {
        let mut entry = Self {
            schema_version: encoding::SCHEMA_VERSION_V1,
            sequence: draft.sequence,
            subject_type: draft.subject.subject_type,
            subject_id: draft.subject.subject_id,
            action: draft.action,
            actor_id: draft.actor_id,
            metadata: draft.metadata,
            created_at: draft.created_at,
            previous_hash: draft.previous_hash,
            entry_hash: Sha256Hash::GENESIS,
        };
        entry.entry_hash = entry.recompute_hash()?;
        Ok(entry)
    }

    /// Re-derive the entry hash from the stored fields.
    ///
    /// Equal to `entry_hash()` for every untampered entry.
    pub fn recompute_hash(&self) -> LedgerResult<Sha256Hash> {
        let bytes = encoding::encode(&self.fields())?;
        Ok(sha256(&bytes))
    }

    fn fields(&self) -> EntryFields<'_> {
        EntryFields {
            schema_version: self.schema_version,
            subject_type: self.subject_type,
            subject_id: &self.subject_id,
            sequence: self.sequence,
            action: self.action,
            actor_id: self.actor_id.as_ref(),
            metadata: &self.metadata,
            created_at: self.created_at,
            previous_hash: &self.previous_hash,
        }
    }

    pub fn schema_version(&self) -> u16 {
        self.schema_version
    }

    /// Zero-based position in the subject's chain.
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    pub fn subject(&self) -> SubjectRef {
        SubjectRef::new(self.subject_type, self.subject_id.clone())
    }

    pub fn subject_type(&self) -> SubjectType {
        self.subject_type
    }

    pub fn subject_id(&self) -> &str {
        &self.subject_id
    }

    pub fn action(&self) -> Action {
        self.action
    }

    pub fn actor_id(&self) -> Option<&ActorId> {
        self.actor_id.as_ref()
    }

    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn previous_hash(&self) -> &Sha256Hash {
        &self.previous_hash
    }

    pub fn entry_hash(&self) -> &Sha256Hash {
        &self.entry_hash
    }

    pub fn is_genesis(&self) -> bool {
        self.sequence == 0 && self.previous_hash.is_genesis()
    }

    /// The lifecycle state this entry puts its subject in, if any.
    ///
    /// Annotations return `None`. `TRADE_STATUS_UPDATED` takes its label
    /// from `metadata.status`, upper-cased.
    pub fn state_label(&self) -> Option<String> {
        if self.action.is_annotation() {
            return None;
        }
        if self.action == Action::TradeStatusUpdated {
            if let Some(status) = self.metadata.get("status").and_then(|v| v.as_str()) {
                return Some(status.to_uppercase());
            }
        }
        Some(self.action.as_str().to_string())
    }
}

/// The lifecycle state of a chain: the label of its latest state-bearing
/// entry, or `GENESIS` when there is none.
pub fn current_state(chain: &[ChainEntry]) -> String {
    chain
        .iter()
        .rev()
        .find_map(ChainEntry::state_label)
        .unwrap_or_else(|| GENESIS_STATE.to_string())
}

// ── Tests ─────────────────────────────────────────────────────────────────────

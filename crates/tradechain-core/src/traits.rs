//! Collaborator traits for the TRADECHAIN ledger core.
//!
//! These traits are the seams between the trusted ledger core and the
//! systems around it:
//!
//! - `LedgerStore`       — durable, append-only entry storage
//! - `TransitionPolicy`  — lifecycle and role rules consulted before append
//! - `MetadataValidator` — per-action payload checks
//! - `FileStore`         — read access to stored document bytes
//! - `EventHook`         — post-commit notifications
//! - `RiskRecalculator`  — the external risk service a hook calls
//!
//! The `ChainBuilder` is the only code that calls
//! `LedgerStore::append_if_tip_matches`.

use std::io::{Cursor, Read};

use tradechain_contracts::{
    action::Action,
    error::LedgerResult,
    hash::Sha256Hash,
    policy::{PolicyVerdict, TransitionContext},
    request::Metadata,
    risk::RiskRecalculationRequest,
    subject::{ActorId, Role, SubjectRef},
};

use crate::{entry::ChainEntry, filter::EntryFilter};

/// Append-only storage of chain entries, one chain per subject.
///
/// There is no update or delete. Implementations must make
/// `append_if_tip_matches` atomic: the entry is either fully persisted or
/// absent, and never persisted when the tip has moved.
pub trait LedgerStore: Send + Sync {
    /// The latest entry of `subject`'s chain, or `None` if it has none.
    fn get_tip(&self, subject: &SubjectRef) -> LedgerResult<Option<ChainEntry>>;

    /// The whole chain of `subject`, ordered by sequence. Empty if unknown.
    fn get_chain(&self, subject: &SubjectRef) -> LedgerResult<Vec<ChainEntry>>;

    /// Persist `entry` as the new tip of `subject`'s chain.
    ///
    /// Compare-and-swap on the tip: succeeds only if the current tip hash
    /// (or `Sha256Hash::GENESIS` for an empty chain) equals
    /// `expected_previous_hash` and the entry extends it. Otherwise returns
    /// `LedgerError::ConcurrentModification` and stores nothing.
    fn append_if_tip_matches(
        &self,
        subject: &SubjectRef,
        expected_previous_hash: &Sha256Hash,
        entry: ChainEntry,
    ) -> LedgerResult<()>;

    /// Every entry matching `filter`, in global commit order.
    fn get_all(&self, filter: &EntryFilter) -> LedgerResult<Vec<ChainEntry>>;

    /// Every entry recorded by `actor_id`, in global commit order.
    fn get_by_actor(&self, actor_id: &ActorId) -> LedgerResult<Vec<ChainEntry>> {
        self.get_all(&EntryFilter::all().actor(actor_id.clone()))
    }

    /// Every subject that owns a chain.
    fn subjects(&self) -> LedgerResult<Vec<SubjectRef>>;
}

/// Lifecycle and role rules for appends.
///
/// Implementations are trusted and deterministic; evaluation must not do I/O.
pub trait TransitionPolicy: Send + Sync {
    /// Decide whether the described append may proceed.
    fn evaluate(&self, ctx: &TransitionContext) -> LedgerResult<PolicyVerdict>;

    /// Whether `role` may request a content integrity check.
    fn may_verify_content(&self, role: &Role) -> bool;
}

/// Per-action validation of entry metadata, run before the chain is read.
pub trait MetadataValidator: Send + Sync {
    /// Return `Err(LedgerError::InvalidMetadata)` if `metadata` is not an
    /// acceptable payload for `action`.
    fn validate(&self, action: Action, metadata: &Metadata) -> LedgerResult<()>;
}

/// Read access to the object store holding document files.
pub trait FileStore: Send + Sync {
    /// Read the full current bytes of `document_id`'s stored file.
    ///
    /// Failures must be reported as `LedgerError::ContentReadError`.
    fn read_bytes(&self, document_id: &str) -> LedgerResult<Vec<u8>>;

    /// Open `document_id`'s stored file as a byte stream.
    ///
    /// The default buffers `read_bytes`. Stores backed by files or object
    /// streams override it so large documents are hashed without being
    /// loaded whole. Failures follow the `read_bytes` contract.
    fn open_reader(&self, document_id: &str) -> LedgerResult<Box<dyn Read + Send + '_>> {
        Ok(Box::new(Cursor::new(self.read_bytes(document_id)?)))
    }
}

/// A side effect run after an entry is durably committed.
///
/// Hooks run on the dispatcher's worker thread. Their failures are retried
/// and logged, never surfaced to the appending caller.
pub trait EventHook: Send + Sync {
    /// Stable name used in logs.
    fn name(&self) -> &str;

    /// Handle one committed entry.
    fn on_append(&self, entry: &ChainEntry) -> LedgerResult<()>;
}

/// The external risk recalculation service.
pub trait RiskRecalculator: Send + Sync {
    /// Request a rescore. Fire-and-forget from the ledger's point of view.
    fn recalculate(&self, request: &RiskRecalculationRequest) -> LedgerResult<()>;
}

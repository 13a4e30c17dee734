//! The compare-and-swap check shared by every store.

use tradechain_contracts::{
    error::{LedgerError, LedgerResult},
    hash::Sha256Hash,
    subject::SubjectRef,
};
use tradechain_core::ChainEntry;

/// Succeed only if `entry` is the valid next link after `tip`.
///
/// The entry must hash to its own `entry_hash` (`UnsealedEntry` otherwise).
/// The current tip hash (GENESIS for an empty chain) must equal
/// `expected_previous_hash`, and the entry itself must belong to `subject`,
/// point at that tip, and carry the next sequence number.
pub(crate) fn check_extends(
    subject: &SubjectRef,
    expected_previous_hash: &Sha256Hash,
    tip: Option<&ChainEntry>,
    entry: &ChainEntry,
) -> LedgerResult<()> {
    if entry.recompute_hash()? != *entry.entry_hash() {
        return Err(LedgerError::UnsealedEntry {
            subject: subject.to_string(),
            sequence: entry.sequence(),
            entry_hash: entry.entry_hash().to_hex(),
        });
    }

    let actual = tip.map(|t| *t.entry_hash()).unwrap_or(Sha256Hash::GENESIS);
    let next_sequence = tip.map(|t| t.sequence() + 1).unwrap_or(0);

    let extends = actual == *expected_previous_hash
        && entry.previous_hash() == expected_previous_hash
        && entry.sequence() == next_sequence
        && entry.subject() == *subject;

    if extends {
        Ok(())
    } else {
        Err(LedgerError::ConcurrentModification {
            subject: subject.to_string(),
            expected_previous_hash: expected_previous_hash.to_hex(),
            actual_tip_hash: actual.to_hex(),
        })
    }
}

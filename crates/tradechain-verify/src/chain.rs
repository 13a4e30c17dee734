//! Chain replay.
//!
//! `verify_entries` re-derives every link of a chain from stored fields
//! alone. For each index *i* it checks, in order:
//!
//!   1. the entry belongs to the chain's subject
//!   2. `sequence == i`
//!   3. `previous_hash` is GENESIS for i = 0, else entry *i−1*'s stored hash
//!   4. `created_at` is not earlier than entry *i−1*'s
//!   5. the recomputed hash equals the stored `entry_hash`
//!
//! Replay stops at the first failure. Everything after a broken entry is
//! untrustworthy, so only the first break is reported.

use tracing::{info, warn};

use tradechain_contracts::{
    error::LedgerResult,
    hash::Sha256Hash,
    subject::SubjectRef,
    verdict::{ChainVerdict, ChainVerification, TamperKind},
};
use tradechain_core::{traits::LedgerStore, ChainEntry};

/// Replay `entries` as the chain of `subject`.
pub fn verify_entries(subject: &SubjectRef, entries: &[ChainEntry]) -> ChainVerification {
    let verdict = replay(subject, entries);
    ChainVerification {
        subject: subject.clone(),
        verdict,
    }
}

fn tampered(index: usize, kind: TamperKind, expected: impl ToString, found: impl ToString) -> ChainVerdict {
    ChainVerdict::Tampered {
        index: index as u64,
        kind,
        expected: expected.to_string(),
        found: found.to_string(),
    }
}

fn replay(subject: &SubjectRef, entries: &[ChainEntry]) -> ChainVerdict {
    let mut expected_previous = Sha256Hash::GENESIS;
    let mut previous_created_at = None;

    for (i, entry) in entries.iter().enumerate() {
        let entry_subject = entry.subject();
        if entry_subject != *subject {
            return tampered(i, TamperKind::SubjectMismatch, subject, entry_subject);
        }

        if entry.sequence() != i as u64 {
            return tampered(i, TamperKind::SequenceGap, i, entry.sequence());
        }

        if *entry.previous_hash() != expected_previous {
            return tampered(i, TamperKind::BrokenLink, expected_previous, entry.previous_hash());
        }

        if let Some(previous) = previous_created_at {
            if entry.created_at() < previous {
                return tampered(
                    i,
                    TamperKind::TimestampRegression,
                    format!("at or after {}", previous),
                    entry.created_at(),
                );
            }
        }

        match entry.recompute_hash() {
            Ok(recomputed) if recomputed == *entry.entry_hash() => {}
            Ok(recomputed) => {
                return tampered(i, TamperKind::HashMismatch, recomputed, entry.entry_hash());
            }
            // A stored entry that no longer encodes cannot match its hash.
            Err(e) => {
                return tampered(
                    i,
                    TamperKind::HashMismatch,
                    entry.entry_hash(),
                    format!("unencodable entry: {}", e),
                );
            }
        }

        expected_previous = *entry.entry_hash();
        previous_created_at = Some(entry.created_at());
    }

    ChainVerdict::Valid {
        length: entries.len() as u64,
        tip_hash: entries.last().map(|e| *e.entry_hash()),
    }
}

/// Snapshot and replay `subject`'s chain from `store`, logging the verdict.
pub fn verify_stored_chain(store: &dyn LedgerStore, subject: &SubjectRef) -> LedgerResult<ChainVerification> {
    let entries = store.get_chain(subject)?;
    let verification = verify_entries(subject, &entries);

    match &verification.verdict {
        ChainVerdict::Valid { length, .. } => {
            info!(subject = %subject, length, "chain verified");
        }
        ChainVerdict::Tampered {
            index,
            kind,
            expected,
            found,
        } => {
            warn!(
                subject = %subject,
                index,
                kind = ?kind,
                expected = %expected,
                found = %found,
                "chain tampering detected"
            );
        }
    }
    Ok(verification)
}

/// Replay every chain in `store`, in subject order.
pub fn sweep(store: &dyn LedgerStore) -> LedgerResult<Vec<ChainVerification>> {
    store
        .subjects()?
        .iter()
        .map(|subject| verify_stored_chain(store, subject))
        .collect()
}

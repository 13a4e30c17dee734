//! Integrity verification verdicts.
//!
//! "Tampering detected" is an expected, testable outcome, so it is modelled
//! as a value here rather than as a `LedgerError`. Callers must keep the two
//! apart: an `Err` means integrity could not be checked, a `Tampered` or
//! `Mismatch` verdict means it was checked and failed.

use serde::{Deserialize, Serialize};

use crate::{hash::Sha256Hash, subject::SubjectRef};

/// Which check failed on a tampered entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TamperKind {
    /// The entry is filed under a different subject than the chain's.
    SubjectMismatch,
    /// The entry's sequence number is not its position in the chain.
    SequenceGap,
    /// `previous_hash` does not match the predecessor's stored hash
    /// (or the genesis sentinel for the first entry).
    BrokenLink,
    /// `created_at` is earlier than the predecessor's.
    TimestampRegression,
    /// The stored `entry_hash` differs from the recomputed one.
    HashMismatch,
}

/// Outcome of replaying one chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChainVerdict {
    /// Every entry links to its predecessor and re-hashes to its stored hash.
    Valid {
        /// Number of entries replayed.
        length: u64,
        /// Stored hash of the last entry, `None` for an empty chain.
        tip_hash: Option<Sha256Hash>,
    },

    /// The first failing entry. Later entries are not examined.
    Tampered {
        /// Zero-based position of the failing entry.
        index: u64,
        kind: TamperKind,
        /// What the check expected to find.
        expected: String,
        /// What the stored entry actually holds.
        found: String,
    },
}

impl ChainVerdict {
    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid { .. })
    }
}

/// A chain verdict together with the subject it was computed for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainVerification {
    pub subject: SubjectRef,
    pub verdict: ChainVerdict,
}

/// Outcome of re-hashing a document's stored file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContentVerdict {
    /// The stored bytes hash to the value recorded at issuance.
    Verified { hash: Sha256Hash },

    /// The stored file was altered or replaced after issuance.
    Mismatch {
        expected_hash: Sha256Hash,
        found_hash: Sha256Hash,
    },

    /// The document's own chain fails replay, so the issuance hash it holds
    /// cannot be trusted. The stored file is not read.
    ChainTampered { index: u64, kind: TamperKind },
}

impl ContentVerdict {
    pub fn is_verified(&self) -> bool {
        matches!(self, Self::Verified { .. })
    }
}

/// A content verdict plus the tamper-evidence entry it produced, if any.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentVerification {
    pub document_id: String,
    pub verdict: ContentVerdict,
    /// Sequence of the `TAMPER_DETECTED` entry recorded for a mismatch.
    pub evidence_sequence: Option<u64>,
}

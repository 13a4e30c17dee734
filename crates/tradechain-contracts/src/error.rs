//! Error types for the TRADECHAIN ledger.
//!
//! All fallible ledger operations return `LedgerResult<T>`. Verification
//! verdicts (a tampered chain, a mismatched file) are not errors; the
//! verifier returns them as values. Only operational failures and
//! rejected appends live here.

use thiserror::Error;

/// The unified error type for the TRADECHAIN ledger.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// The action is not permitted in the subject's current lifecycle state.
    #[error("invalid transition: '{action}' on {subject}: {reason}")]
    InvalidTransition {
        subject: String,
        action: String,
        reason: String,
    },

    /// The actor's role is not allowed to perform the action.
    #[error("role '{role}' is not permitted to perform '{action}'")]
    Forbidden { role: String, action: String },

    /// The chain tip moved between the builder's read and the store's write.
    ///
    /// The caller should re-read the tip before deciding whether to retry;
    /// the ledger never retries on its own.
    #[error(
        "concurrent modification on {subject}: expected tip {expected_previous_hash}, found {actual_tip_hash}"
    )]
    ConcurrentModification {
        subject: String,
        expected_previous_hash: String,
        actual_tip_hash: String,
    },

    /// An entry offered to a store does not hash to its own `entry_hash`.
    ///
    /// Only entries sealed by the chain builder can be stored.
    #[error("entry #{sequence} for {subject} does not hash to its stored entry_hash {entry_hash}")]
    UnsealedEntry {
        subject: String,
        sequence: u64,
        entry_hash: String,
    },

    /// The stored file for a document could not be read.
    ///
    /// Distinct from a content mismatch: integrity could not be checked at all.
    #[error("could not read content of document '{document_id}': {reason}")]
    ContentReadError { document_id: String, reason: String },

    /// The document chain carries no issuance hash to compare against.
    #[error("document '{document_id}' has no ISSUED entry with a recorded hash")]
    NotIssued { document_id: String },

    /// The entry metadata failed validation for its action.
    #[error("invalid metadata for '{action}': {reason}")]
    InvalidMetadata { action: String, reason: String },

    /// An action tag outside the known set.
    #[error("unknown action '{action}'")]
    UnknownAction { action: String },

    /// A subject reference that is not of the form `<type>/<id>`.
    #[error("invalid subject reference '{input}'")]
    InvalidSubject { input: String },

    /// A digest that is not 64 hex characters.
    #[error("invalid SHA-256 hex digest '{input}'")]
    InvalidHash { input: String },

    /// An entry declares a canonical encoding version this build cannot hash.
    #[error("unsupported entry schema version {version}")]
    UnsupportedSchemaVersion { version: u16 },

    /// An entry field could not be canonically encoded.
    #[error("encoding error: {reason}")]
    Encoding { reason: String },

    /// The ledger store failed. The append is either fully committed or absent.
    #[error("storage error: {reason}")]
    Storage { reason: String },

    /// A required configuration value is missing or invalid.
    #[error("configuration error: {reason}")]
    ConfigError { reason: String },

    /// An event hook failed to handle a committed entry.
    ///
    /// Only ever logged by the hook dispatcher; never returned from an append.
    #[error("hook '{hook}' failed: {reason}")]
    HookFailed { hook: String, reason: String },
}

impl LedgerError {
    /// True for operational failures a caller may retry after re-reading state.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::ConcurrentModification { .. } | Self::ContentReadError { .. } | Self::Storage { .. }
        )
    }
}

/// Convenience alias used throughout the TRADECHAIN crates.
pub type LedgerResult<T> = Result<T, LedgerError>;

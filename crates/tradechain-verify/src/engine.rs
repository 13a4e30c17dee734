//! The integrity verifier.
//!
//! `IntegrityVerifier` answers two questions on demand:
//!
//! 1. **Chain** — does a subject's chain still replay from stored fields?
//! 2. **Content** — does a document's stored file still hash to the value
//!    recorded when it was issued?
//!
//! A content check replays the document's chain first and only trusts the
//! issuance hash of a chain that replays cleanly.
//!
//! Both checks read a snapshot and never block appends. A content mismatch
//! is recorded as a `TAMPER_DETECTED` entry on the document's chain, once
//! per distinct (expected, found) pair, so re-running a check on unchanged
//! data neither changes its verdict nor adds evidence.

use std::sync::Arc;

use tracing::{debug, error, info, warn};

use tradechain_contracts::{
    action::Action,
    error::{LedgerError, LedgerResult},
    hash::Sha256Hash,
    request::AppendRequest,
    subject::{Actor, SubjectRef},
    verdict::{ChainVerdict, ChainVerification, ContentVerdict, ContentVerification},
};
use tradechain_core::{
    config::IntegritySettings,
    hasher::hash_reader,
    traits::{FileStore, LedgerStore},
    ChainBuilder, ChainEntry,
};

use crate::chain;

/// Chain and content integrity checks over one ledger.
pub struct IntegrityVerifier {
    builder: Arc<ChainBuilder>,
    files: Arc<dyn FileStore>,
    settings: IntegritySettings,
}

impl IntegrityVerifier {
    /// Evidence entries are appended through `builder`, so they obey the
    /// same policy and concurrency rules as every other entry.
    pub fn new(builder: Arc<ChainBuilder>, files: Arc<dyn FileStore>) -> Self {
        Self {
            builder,
            files,
            settings: IntegritySettings::default(),
        }
    }

    pub fn with_settings(mut self, settings: IntegritySettings) -> Self {
        self.settings = settings;
        self
    }

    fn store(&self) -> &dyn LedgerStore {
        self.builder.store().as_ref()
    }

    /// Replay `subject`'s chain.
    pub fn verify_chain(&self, subject: &SubjectRef) -> LedgerResult<ChainVerification> {
        chain::verify_stored_chain(self.store(), subject)
    }

    /// Replay every chain in the ledger.
    pub fn sweep(&self) -> LedgerResult<Vec<ChainVerification>> {
        chain::sweep(self.store())
    }

    /// Check `document_id`'s stored file against its issuance hash, on
    /// behalf of `actor`.
    ///
    /// Returns `Forbidden` unless the policy lets `actor`'s role request
    /// content checks.
    pub fn verify_content_as(&self, actor: &Actor, document_id: &str) -> LedgerResult<ContentVerification> {
        if !self.builder.policy().may_verify_content(&actor.role) {
            warn!(
                actor = %actor.id,
                role = %actor.role,
                document_id,
                "content verification refused for role"
            );
            return Err(LedgerError::Forbidden {
                role: actor.role.to_string(),
                action: "VERIFY_CONTENT".to_string(),
            });
        }
        self.verify_content(document_id)
    }

    /// Check `document_id`'s stored file against its issuance hash.
    ///
    /// The document's chain is replayed first. If it is tampered the verdict
    /// is `ChainTampered`, the file is not read and no evidence is recorded.
    ///
    /// # Errors
    ///
    /// - `NotIssued` — the document's chain has no `ISSUED` entry
    /// - `InvalidMetadata` — the `ISSUED` entry carries no usable `hash`
    /// - `ContentReadError` — the file could not be read; this is never
    ///   reported as a mismatch
    pub fn verify_content(&self, document_id: &str) -> LedgerResult<ContentVerification> {
        let subject = SubjectRef::document(document_id);
        let entries = self.store().get_chain(&subject)?;

        if let ChainVerdict::Tampered { index, kind, .. } = chain::verify_entries(&subject, &entries).verdict {
            warn!(
                document_id,
                index,
                kind = ?kind,
                "document chain fails replay, issuance hash not trusted"
            );
            return Ok(ContentVerification {
                document_id: document_id.to_string(),
                verdict: ContentVerdict::ChainTampered { index, kind },
                evidence_sequence: None,
            });
        }

        let issued = entries
            .iter()
            .find(|e| e.action() == Action::Issued)
            .ok_or_else(|| LedgerError::NotIssued {
                document_id: document_id.to_string(),
            })?;
        let expected_hash = issuance_hash(issued)?;

        let read_error = |reason: String| LedgerError::ContentReadError {
            document_id: document_id.to_string(),
            reason,
        };
        let reader = self.files.open_reader(document_id).map_err(|e| match e {
            LedgerError::ContentReadError { .. } => e,
            other => read_error(other.to_string()),
        })?;
        let found_hash = hash_reader(reader).map_err(|e| read_error(e.to_string()))?;

        debug!(
            document_id,
            expected = %expected_hash,
            found = %found_hash,
            "content rehashed"
        );

        if found_hash == expected_hash {
            info!(document_id, hash = %found_hash, "content verified");
            return Ok(ContentVerification {
                document_id: document_id.to_string(),
                verdict: ContentVerdict::Verified { hash: found_hash },
                evidence_sequence: None,
            });
        }

        warn!(
            document_id,
            expected = %expected_hash,
            found = %found_hash,
            "content tampering detected"
        );

        let evidence_sequence = if self.settings.record_tamper_evidence {
            self.record_evidence(&subject, &entries, issued, &expected_hash, &found_hash)
        } else {
            None
        };

        Ok(ContentVerification {
            document_id: document_id.to_string(),
            verdict: ContentVerdict::Mismatch {
                expected_hash,
                found_hash,
            },
            evidence_sequence,
        })
    }

    /// Append (or find) the `TAMPER_DETECTED` entry for this mismatch.
    ///
    /// Failure is logged and reported as `None`; the verdict stands.
    fn record_evidence(
        &self,
        subject: &SubjectRef,
        entries: &[ChainEntry],
        issued: &ChainEntry,
        expected: &Sha256Hash,
        found: &Sha256Hash,
    ) -> Option<u64> {
        let (expected_hex, found_hex) = (expected.to_hex(), found.to_hex());

        if let Some(existing) = entries.iter().find(|e| {
            e.action() == Action::TamperDetected
                && e.metadata().get("expected_hash").and_then(|v| v.as_str()) == Some(expected_hex.as_str())
                && e.metadata().get("found_hash").and_then(|v| v.as_str()) == Some(found_hex.as_str())
        }) {
            debug!(subject = %subject, sequence = existing.sequence(), "tamper evidence already recorded");
            return Some(existing.sequence());
        }

        let mut request = AppendRequest::new(subject.clone(), Action::TamperDetected)
            .actor(Actor::system(self.settings.system_actor.clone()))
            .meta("check", "content")
            .meta("expected_hash", expected_hex.clone())
            .meta("found_hash", found_hex.clone())
            .idempotency_key(format!("tamper:{}:{}", expected_hex, found_hex));
        if let Some(issuer) = issued.actor_id() {
            request = request.meta("owner_id", issuer.0.clone());
        }

        match self.builder.append(request) {
            Ok(entry) => {
                info!(subject = %subject, sequence = entry.sequence(), "tamper evidence recorded");
                Some(entry.sequence())
            }
            Err(e) => {
                error!(subject = %subject, error = %e, "failed to record tamper evidence");
                None
            }
        }
    }
}

/// The content hash recorded by an `ISSUED` entry.
fn issuance_hash(issued: &ChainEntry) -> LedgerResult<Sha256Hash> {
    let hex = issued
        .metadata()
        .get("hash")
        .and_then(|v| v.as_str())
        .ok_or_else(|| LedgerError::InvalidMetadata {
            action: Action::Issued.to_string(),
            reason: "ISSUED entry has no 'hash' string".to_string(),
        })?;
    Sha256Hash::from_hex(hex).map_err(|e| LedgerError::InvalidMetadata {
        action: Action::Issued.to_string(),
        reason: e.to_string(),
    })
}

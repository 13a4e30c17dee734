//! Wiring for the trade-finance reference ledger.
//!
//! `TradeLedger` assembles the real TRADECHAIN components (TOML policy,
//! metadata schemas, chain builder, risk hook, integrity verifier) over any
//! `LedgerStore`, with the mock file store and risk service from
//! `mock_data`.

use std::sync::Arc;

use tracing::debug;

use tradechain_contracts::{
    action::Action,
    error::LedgerResult,
    request::AppendRequest,
    subject::{Actor, SubjectRef},
};
use tradechain_core::{
    hasher::sha256,
    traits::{EventHook, LedgerStore},
    ChainBuilder, ChainEntry, HookDispatcher, LedgerConfig, RiskRecalculationHook,
};
use tradechain_policy::TomlTransitionPolicy;
use tradechain_store::InMemoryLedgerStore;
use tradechain_verify::{IntegrityVerifier, MetadataSchemaValidator};

use crate::mock_data::{MockFileStore, RecordingRiskService};

pub const TRADE_FINANCE_POLICY: &str = include_str!("../policies/trade_finance.toml");
pub const LEDGER_CONFIG: &str = include_str!("../config/ledger.toml");

/// A fully wired ledger plus handles on its mock collaborators.
pub struct TradeLedger {
    pub builder: Arc<ChainBuilder>,
    pub verifier: IntegrityVerifier,
    pub files: Arc<MockFileStore>,
    pub risk: Arc<RecordingRiskService>,
}

impl TradeLedger {
    /// A ledger over a fresh in-memory store with the bundled configuration.
    pub fn in_memory() -> LedgerResult<Self> {
        Self::over(Arc::new(InMemoryLedgerStore::new()))
    }

    /// A ledger over `store` with the bundled configuration.
    pub fn over(store: Arc<dyn LedgerStore>) -> LedgerResult<Self> {
        let config = LedgerConfig::from_toml_str(LEDGER_CONFIG)?;
        Self::with_config(store, &config)
    }

    pub fn with_config(store: Arc<dyn LedgerStore>, config: &LedgerConfig) -> LedgerResult<Self> {
        let policy = Arc::new(TomlTransitionPolicy::from_toml_str(TRADE_FINANCE_POLICY)?);
        let validator = Arc::new(MetadataSchemaValidator::with_default_schemas()?);

        let risk = Arc::new(RecordingRiskService::new());
        let risk_hook = RiskRecalculationHook::new(risk.clone(), config.hooks.risk_triggers.iter().copied());
        let hooks: Vec<Arc<dyn EventHook>> = vec![Arc::new(risk_hook)];
        let hooks = HookDispatcher::spawn(hooks, &config.hooks)?;

        let builder = Arc::new(
            ChainBuilder::new(store, policy)
                .with_validator(validator)
                .with_hooks(hooks)
                .with_idempotency_window(config.builder.idempotency_window()),
        );

        let files = Arc::new(MockFileStore::new());
        let verifier =
            IntegrityVerifier::new(builder.clone(), files.clone()).with_settings(config.integrity.clone());

        debug!(
            triggers = config.hooks.risk_triggers.len(),
            evidence = config.integrity.record_tamper_evidence,
            "trade ledger wired"
        );

        Ok(Self {
            builder,
            verifier,
            files,
            risk,
        })
    }

    pub fn append(&self, request: AppendRequest) -> LedgerResult<ChainEntry> {
        self.builder.append(request)
    }

    pub fn chain(&self, subject: &SubjectRef) -> LedgerResult<Vec<ChainEntry>> {
        self.builder.get_chain(subject)
    }

    /// Upload `bytes` for `document_id` and record its issuance.
    ///
    /// The `ISSUED` entry carries the content hash the verifier later
    /// checks against, and names `actor` as the document's owner.
    pub fn issue_document(
        &self,
        actor: &Actor,
        document_id: &str,
        document_type: &str,
        bytes: &[u8],
    ) -> LedgerResult<ChainEntry> {
        self.files.put(document_id, bytes)?;
        self.builder.append(
            AppendRequest::new(SubjectRef::document(document_id), Action::Issued)
                .actor(actor.clone())
                .meta("hash", sha256(bytes).to_hex())
                .meta("document_type", document_type)
                .meta("owner_id", actor.id.0.clone())
                .meta("size_bytes", bytes.len()),
        )
    }

    /// Drain pending hook notifications. Appends after this fire no hooks.
    pub fn shutdown(&self) {
        self.builder.shutdown();
    }
}

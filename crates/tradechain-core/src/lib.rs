//! # tradechain-core
//!
//! The hash-chain construction and append protocol for the TRADECHAIN
//! ledger.
//!
//! This crate provides:
//! - The SHA-256 hasher and the frozen canonical entry encoding (v1)
//! - `ChainEntry`, the immutable ledger record
//! - The collaborator traits (`LedgerStore`, `TransitionPolicy`,
//!   `MetadataValidator`, `FileStore`, `EventHook`, `RiskRecalculator`)
//! - `ChainBuilder`, the single append path, and the `HookDispatcher`
//! - `LedgerConfig`
//!
//! ## Usage
//!
//! ```rust,ignore
//! use tradechain_core::ChainBuilder;
//!
//! let builder = ChainBuilder::new(store, policy);
//! let entry = builder.append(
//!     AppendRequest::new(SubjectRef::document("D1"), Action::Issued)
//!         .actor(Actor::new("bank-1", "bank"))
//!         .meta("hash", content_hash.to_hex()),
//! )?;
//! ```

pub mod builder;
pub mod config;
pub mod encoding;
pub mod entry;
pub mod filter;
pub mod hasher;
pub mod hooks;
pub mod traits;

pub use builder::{ChainBuilder, PreparedAppend};
pub use config::LedgerConfig;
pub use entry::ChainEntry;
pub use filter::EntryFilter;
pub use hooks::{HookDispatcher, RiskRecalculationHook};

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use std::{
        collections::HashMap,
        sync::{
            atomic::{AtomicU32, Ordering},
            Arc, Mutex,
        },
        time::Duration,
    };

    use tradechain_contracts::{
        action::Action,
        error::{LedgerError, LedgerResult},
        hash::Sha256Hash,
        policy::{PolicyVerdict, TransitionContext},
        request::{AppendRequest, Metadata},
        risk::RiskRecalculationRequest,
        subject::{Actor, Role, SubjectRef},
    };

    use crate::{
        config::HookSettings,
        hasher::{hash_reader, sha256},
        traits::{EventHook, LedgerStore, MetadataValidator, RiskRecalculator, TransitionPolicy},
        ChainBuilder, ChainEntry, EntryFilter, HookDispatcher, RiskRecalculationHook,
    };

    // ── Mock helpers ─────────────────────────────────────────────────────────

    /// A minimal CAS store: one Vec per subject behind a single mutex.
    #[derive(Default)]
    struct MockStore {
        chains: Mutex<HashMap<SubjectRef, Vec<ChainEntry>>>,
        log: Mutex<Vec<ChainEntry>>,
    }

    impl LedgerStore for MockStore {
        fn get_tip(&self, subject: &SubjectRef) -> LedgerResult<Option<ChainEntry>> {
            Ok(self
                .chains
                .lock()
                .unwrap()
                .get(subject)
                .and_then(|c| c.last().cloned()))
        }

        fn get_chain(&self, subject: &SubjectRef) -> LedgerResult<Vec<ChainEntry>> {
            Ok(self.chains.lock().unwrap().get(subject).cloned().unwrap_or_default())
        }

        fn append_if_tip_matches(
            &self,
            subject: &SubjectRef,
            expected_previous_hash: &Sha256Hash,
            entry: ChainEntry,
        ) -> LedgerResult<()> {
            let mut chains = self.chains.lock().unwrap();
            let chain = chains.entry(subject.clone()).or_default();
            let tip = chain
                .last()
                .map(|e| *e.entry_hash())
                .unwrap_or(Sha256Hash::GENESIS);
            if tip != *expected_previous_hash {
                return Err(LedgerError::ConcurrentModification {
                    subject: subject.to_string(),
                    expected_previous_hash: expected_previous_hash.to_hex(),
                    actual_tip_hash: tip.to_hex(),
                });
            }
            chain.push(entry.clone());
            self.log.lock().unwrap().push(entry);
            Ok(())
        }

        fn get_all(&self, filter: &EntryFilter) -> LedgerResult<Vec<ChainEntry>> {
            Ok(self
                .log
                .lock()
                .unwrap()
                .iter()
                .filter(|e| filter.matches(e))
                .cloned()
                .collect())
        }

        fn subjects(&self) -> LedgerResult<Vec<SubjectRef>> {
            Ok(self.chains.lock().unwrap().keys().cloned().collect())
        }
    }

    /// A policy that returns a fixed verdict and records every context.
    struct MockPolicy {
        verdict: PolicyVerdict,
        seen: Mutex<Vec<TransitionContext>>,
    }

    impl MockPolicy {
        fn allow() -> Self {
            Self::with(PolicyVerdict::Allow)
        }

        fn with(verdict: PolicyVerdict) -> Self {
            Self {
                verdict,
                seen: Mutex::new(vec![]),
            }
        }
    }

    impl TransitionPolicy for MockPolicy {
        fn evaluate(&self, ctx: &TransitionContext) -> LedgerResult<PolicyVerdict> {
            self.seen.lock().unwrap().push(ctx.clone());
            Ok(self.verdict.clone())
        }

        fn may_verify_content(&self, _role: &Role) -> bool {
            true
        }
    }

    /// Rejects any metadata containing the key "reject".
    struct RejectingValidator;

    impl MetadataValidator for RejectingValidator {
        fn validate(&self, action: Action, metadata: &Metadata) -> LedgerResult<()> {
            if metadata.contains_key("reject") {
                return Err(LedgerError::InvalidMetadata {
                    action: action.to_string(),
                    reason: "rejected by test validator".to_string(),
                });
            }
            Ok(())
        }
    }

    fn builder_with(policy: Arc<MockPolicy>) -> (Arc<MockStore>, ChainBuilder) {
        let store = Arc::new(MockStore::default());
        let builder = ChainBuilder::new(store.clone(), policy);
        (store, builder)
    }

    fn issue(subject: &SubjectRef) -> AppendRequest {
        AppendRequest::new(subject.clone(), Action::Issued)
            .actor(Actor::new("bank-1", Role::BANK))
            .meta("hash", sha256(b"bill of lading").to_hex())
    }

    // ── Hasher ───────────────────────────────────────────────────────────────

    #[test]
    fn sha256_matches_known_vector() {
        assert_eq!(
            sha256(b"abc").to_hex(),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn hash_reader_equals_one_shot_hash() {
        let data = vec![42u8; 20_000];
        assert_eq!(hash_reader(&data[..]).unwrap(), sha256(&data));
    }

    // ── Append protocol ──────────────────────────────────────────────────────

    #[test]
    fn first_append_links_to_genesis() {
        let (_, builder) = builder_with(Arc::new(MockPolicy::allow()));
        let d1 = SubjectRef::document("D1");

        let entry = builder.append(issue(&d1)).unwrap();
        assert_eq!(entry.sequence(), 0);
        assert_eq!(*entry.previous_hash(), Sha256Hash::GENESIS);
        assert_eq!(entry.recompute_hash().unwrap(), *entry.entry_hash());
    }

    #[test]
    fn appends_link_each_entry_to_its_predecessor() {
        let (_, builder) = builder_with(Arc::new(MockPolicy::allow()));
        let d1 = SubjectRef::document("D1");

        let e0 = builder.append(issue(&d1)).unwrap();
        let e1 = builder
            .append(AppendRequest::new(d1.clone(), Action::Verified))
            .unwrap();
        let e2 = builder
            .append(AppendRequest::new(d1.clone(), Action::Amended).meta("field", "port"))
            .unwrap();

        assert_eq!(e1.previous_hash(), e0.entry_hash());
        assert_eq!(e2.previous_hash(), e1.entry_hash());
        assert_ne!(e0.entry_hash(), e1.entry_hash());
        assert_eq!(e2.sequence(), 2);
        assert!(e1.created_at() >= e0.created_at());
        assert!(e2.created_at() >= e1.created_at());
        assert_eq!(builder.get_chain(&d1).unwrap().len(), 3);
    }

    #[test]
    fn policy_sees_state_and_role() {
        let policy = Arc::new(MockPolicy::allow());
        let (_, builder) = builder_with(policy.clone());
        let t1 = SubjectRef::trade("T-1");

        builder
            .append(AppendRequest::new(t1.clone(), Action::TradeCreated))
            .unwrap();
        builder
            .append(
                AppendRequest::new(t1.clone(), Action::TradeStatusUpdated)
                    .actor(Actor::new("bank-1", Role::BANK))
                    .meta("status", "completed"),
            )
            .unwrap();
        builder
            .append(AppendRequest::new(t1, Action::Paid).actor(Actor::new("bank-1", Role::BANK)))
            .unwrap();

        let seen = policy.seen.lock().unwrap();
        assert_eq!(seen[0].current_state, "GENESIS");
        assert_eq!(seen[0].role, "system");
        assert!(seen[0].is_genesis());
        assert_eq!(seen[1].current_state, "TRADE_CREATED");
        assert_eq!(seen[2].current_state, "COMPLETED");
        assert_eq!(seen[2].role, "bank");
        assert_eq!(seen[2].previous_action, Some(Action::TradeStatusUpdated));
        assert_eq!(seen[2].chain_length, 2);
    }

    #[test]
    fn denied_append_leaves_chain_unchanged() {
        let policy = Arc::new(MockPolicy::with(PolicyVerdict::Deny {
            reason: "trade is not COMPLETED".to_string(),
        }));
        let (store, builder) = builder_with(policy);
        let t1 = SubjectRef::trade("T-1");

        match builder.append(AppendRequest::new(t1.clone(), Action::Paid)) {
            Err(LedgerError::InvalidTransition { reason, action, .. }) => {
                assert_eq!(action, "PAID");
                assert!(reason.contains("not COMPLETED"));
            }
            other => panic!("expected InvalidTransition, got {other:?}"),
        }
        assert!(store.get_chain(&t1).unwrap().is_empty());
    }

    #[test]
    fn forbidden_role_is_reported_distinctly() {
        let policy = Arc::new(MockPolicy::with(PolicyVerdict::Forbidden {
            reason: "bank or admin only".to_string(),
        }));
        let (_, builder) = builder_with(policy);

        let result = builder.append(
            AppendRequest::new(SubjectRef::document("D1"), Action::Shipped)
                .actor(Actor::new("acme", Role::CORPORATE)),
        );
        match result {
            Err(LedgerError::Forbidden { role, action }) => {
                assert_eq!(role, "corporate");
                assert_eq!(action, "SHIPPED");
            }
            other => panic!("expected Forbidden, got {other:?}"),
        }
    }

    #[test]
    fn invalid_metadata_is_rejected_before_policy() {
        let policy = Arc::new(MockPolicy::allow());
        let store = Arc::new(MockStore::default());
        let builder = ChainBuilder::new(store.clone(), policy.clone())
            .with_validator(Arc::new(RejectingValidator));

        let result = builder.append(issue(&SubjectRef::document("D1")).meta("reject", true));
        assert!(matches!(result, Err(LedgerError::InvalidMetadata { .. })));
        assert!(policy.seen.lock().unwrap().is_empty());
        assert!(store.log.lock().unwrap().is_empty());
    }

    // ── Concurrency ──────────────────────────────────────────────────────────

    #[test]
    fn two_appends_on_the_same_tip_exactly_one_wins() {
        let (store, builder) = builder_with(Arc::new(MockPolicy::allow()));
        let d1 = SubjectRef::document("D1");
        builder.append(issue(&d1)).unwrap();

        let a = builder
            .prepare(AppendRequest::new(d1.clone(), Action::Verified))
            .unwrap();
        let b = builder
            .prepare(AppendRequest::new(d1.clone(), Action::Amended))
            .unwrap();
        assert_eq!(a.expected_previous_hash(), b.expected_previous_hash());

        builder.commit(a).unwrap();
        match builder.commit(b) {
            Err(LedgerError::ConcurrentModification { subject, .. }) => {
                assert_eq!(subject, "document/D1");
            }
            other => panic!("expected ConcurrentModification, got {other:?}"),
        }

        let chain = store.get_chain(&d1).unwrap();
        assert_eq!(chain.len(), 2);
        assert_eq!(chain[1].action(), Action::Verified);
    }

    // ── Idempotency ──────────────────────────────────────────────────────────

    #[test]
    fn duplicate_idempotency_key_collapses_to_one_entry() {
        let (store, builder) = builder_with(Arc::new(MockPolicy::allow()));
        let d1 = SubjectRef::document("D1");

        let first = builder.append(issue(&d1).idempotency_key("upload-1")).unwrap();
        let second = builder.append(issue(&d1).idempotency_key("upload-1")).unwrap();

        assert_eq!(first, second);
        assert_eq!(store.get_chain(&d1).unwrap().len(), 1);
    }

    #[test]
    fn zero_window_disables_idempotency() {
        let store = Arc::new(MockStore::default());
        let builder = ChainBuilder::new(store.clone(), Arc::new(MockPolicy::allow()))
            .with_idempotency_window(Duration::ZERO);
        let d1 = SubjectRef::document("D1");

        builder.append(issue(&d1).idempotency_key("k")).unwrap();
        builder.append(issue(&d1).idempotency_key("k")).unwrap();
        assert_eq!(store.get_chain(&d1).unwrap().len(), 2);
    }

    // ── Hooks ────────────────────────────────────────────────────────────────

    /// Records every entry it sees.
    struct RecordingHook {
        seen: Arc<Mutex<Vec<u64>>>,
    }

    impl EventHook for RecordingHook {
        fn name(&self) -> &str {
            "recording"
        }

        fn on_append(&self, entry: &ChainEntry) -> LedgerResult<()> {
            self.seen.lock().unwrap().push(entry.sequence());
            Ok(())
        }
    }

    /// Always fails, counting attempts.
    struct FailingHook {
        attempts: Arc<AtomicU32>,
    }

    impl EventHook for FailingHook {
        fn name(&self) -> &str {
            "failing"
        }

        fn on_append(&self, _entry: &ChainEntry) -> LedgerResult<()> {
            self.attempts.fetch_add(1, Ordering::SeqCst);
            Err(LedgerError::HookFailed {
                hook: "failing".to_string(),
                reason: "downstream unavailable".to_string(),
            })
        }
    }

    #[test]
    fn hook_failures_are_retried_and_never_fail_the_append() {
        let attempts = Arc::new(AtomicU32::new(0));
        let seen = Arc::new(Mutex::new(vec![]));
        let settings = HookSettings {
            max_attempts: 3,
            retry_backoff_ms: 1,
            ..HookSettings::default()
        };
        let hooks: Vec<Arc<dyn EventHook>> = vec![
            Arc::new(FailingHook { attempts: attempts.clone() }),
            Arc::new(RecordingHook { seen: seen.clone() }),
        ];
        let hooks = HookDispatcher::spawn(hooks, &settings).unwrap();

        let store = Arc::new(MockStore::default());
        let builder = ChainBuilder::new(store.clone(), Arc::new(MockPolicy::allow())).with_hooks(hooks);
        let d1 = SubjectRef::document("D1");

        builder.append(issue(&d1)).unwrap();
        builder
            .append(AppendRequest::new(d1.clone(), Action::Verified))
            .unwrap();
        builder.shutdown();

        assert_eq!(attempts.load(Ordering::SeqCst), 6, "3 attempts per entry");
        assert_eq!(*seen.lock().unwrap(), vec![0, 1]);
        assert_eq!(store.get_chain(&d1).unwrap().len(), 2);
    }

    /// Collects every request it receives.
    #[derive(Default)]
    struct RecordingRisk {
        requests: Mutex<Vec<RiskRecalculationRequest>>,
    }

    impl RiskRecalculator for RecordingRisk {
        fn recalculate(&self, request: &RiskRecalculationRequest) -> LedgerResult<()> {
            self.requests.lock().unwrap().push(request.clone());
            Ok(())
        }
    }

    #[test]
    fn risk_hook_fires_only_for_triggers_and_prefers_owner_id() {
        let risk = Arc::new(RecordingRisk::default());
        let hook = RiskRecalculationHook::new(risk.clone(), [Action::TradeDisputed]);
        let hooks: Vec<Arc<dyn EventHook>> = vec![Arc::new(hook)];
        let hooks = HookDispatcher::spawn(hooks, &HookSettings::default()).unwrap();
        let builder = ChainBuilder::new(Arc::new(MockStore::default()), Arc::new(MockPolicy::allow()))
            .with_hooks(hooks);
        let t1 = SubjectRef::trade("T-1");

        builder
            .append(
                AppendRequest::new(t1.clone(), Action::TradeCreated)
                    .actor(Actor::new("acme", Role::CORPORATE)),
            )
            .unwrap();
        builder
            .append(
                AppendRequest::new(t1.clone(), Action::TradeDisputed)
                    .actor(Actor::new("bank-1", Role::BANK))
                    .meta("owner_id", "acme"),
            )
            .unwrap();
        builder.shutdown();

        let requests = risk.requests.lock().unwrap();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].subject_owner_id, "acme");
        assert_eq!(requests[0].trigger_reason, "TRADE_DISPUTED on trade/T-1");
        assert_eq!(requests[0].sequence, 1);
    }

    #[test]
    fn filter_matches_on_every_set_field() {
        let (store, builder) = builder_with(Arc::new(MockPolicy::allow()));
        builder.append(issue(&SubjectRef::document("D1"))).unwrap();
        builder
            .append(
                AppendRequest::new(SubjectRef::trade("T-1"), Action::TradeCreated)
                    .actor(Actor::new("acme", Role::CORPORATE)),
            )
            .unwrap();

        let by_actor = store
            .get_by_actor(&tradechain_contracts::subject::ActorId::new("acme"))
            .unwrap();
        assert_eq!(by_actor.len(), 1);
        assert_eq!(by_actor[0].action(), Action::TradeCreated);

        let issued = store.get_all(&EntryFilter::all().action(Action::Issued)).unwrap();
        assert_eq!(issued.len(), 1);
        assert_eq!(store.get_all(&EntryFilter::all()).unwrap().len(), 2);
    }
}

//! # tradechain-ref-trade
//!
//! Trade-finance reference runtime for the TRADECHAIN ledger.
//!
//! Demonstrates five scenarios using mock documents and counterparties:
//!
//! 1. **Document Lifecycle** — a bill of lading from issuance to receipt,
//!    with a role refusal and a lifecycle refusal on the way.
//! 2. **Trade Settlement** — payment gated on completion, and risk
//!    recalculation triggered by payment and dispute.
//! 3. **Content Tampering** — a swapped document file detected by
//!    re-hashing, with tamper evidence recorded on the chain.
//! 4. **Ledger Tampering** — an in-place edit of the ledger file caught by
//!    chain replay.
//! 5. **Concurrent Appends** — racing updates to one trade; exactly one
//!    commits.
//!
//! All data is hardcoded and fictional. No external systems are contacted.

pub mod mock_data;
pub mod runtime;
pub mod scenarios;

pub use runtime::TradeLedger;

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use std::{fs, path::Path, sync::Arc};

    use tradechain_contracts::{
        action::Action,
        error::LedgerError,
        policy::{PolicyVerdict, TransitionContext},
        request::AppendRequest,
        subject::{Actor, Role, SubjectRef, SubjectType},
        verdict::{ChainVerdict, ContentVerdict, TamperKind},
    };
    use tradechain_core::{entry::current_state, traits::TransitionPolicy, LedgerConfig};
    use tradechain_policy::TomlTransitionPolicy;
    use tradechain_store::JsonlLedgerStore;
    use tradechain_verify::verify_stored_chain;

    use crate::{
        mock_data::{
            admin, auditor, exporter, importer, issuing_bank, BILL_OF_LADING, COMMERCIAL_INVOICE,
            FORGED_BILL_OF_LADING,
        },
        scenarios::{chain_tamper, concurrent_append},
        TradeLedger,
    };

    fn status(trade: &SubjectRef, actor: Actor, status: &str) -> AppendRequest {
        AppendRequest::new(trade.clone(), Action::TradeStatusUpdated)
            .actor(actor)
            .meta("status", status)
    }

    // ── Bundled policy ────────────────────────────────────────────────────────

    /// The policy and config shipped with the crate load from disk.
    #[test]
    fn test_bundled_files_load() {
        let root = Path::new(env!("CARGO_MANIFEST_DIR"));
        let policy = TomlTransitionPolicy::from_file(&root.join("policies/trade_finance.toml")).unwrap();
        assert_eq!(policy.config().rules.first().map(|r| r.id.as_str()), Some("record-tamper-evidence"));
        assert!(policy.may_verify_content(&auditor().role));
        assert!(!policy.may_verify_content(&exporter().role));

        let config = LedgerConfig::from_file(&root.join("config/ledger.toml")).unwrap();
        assert_eq!(config.hooks.risk_triggers.len(), 4);
        assert_eq!(config.integrity.system_actor, "system:integrity-verifier");
    }

    /// Lifecycle moves after issuance belong to banks and admins only.
    #[test]
    fn test_lifecycle_actions_are_bank_or_admin() {
        let policy = TomlTransitionPolicy::from_toml_str(crate::runtime::TRADE_FINANCE_POLICY).unwrap();
        let cases = [
            (SubjectType::Document, Action::Amended, "ISSUED"),
            (SubjectType::Document, Action::Shipped, "VERIFIED"),
            (SubjectType::Document, Action::Received, "SHIPPED"),
            (SubjectType::Document, Action::Paid, "RECEIVED"),
            (SubjectType::Document, Action::Cancelled, "ISSUED"),
            (SubjectType::Trade, Action::Paid, "COMPLETED"),
            (SubjectType::Trade, Action::Cancelled, "PENDING"),
        ];

        for (subject_type, action, state) in cases {
            let ctx = |role: &str| TransitionContext {
                subject_type,
                subject_id: "X-1".to_string(),
                action,
                actor_id: Some("someone".to_string()),
                role: role.to_string(),
                current_state: state.to_string(),
                previous_action: None,
                chain_length: 2,
            };

            for role in [Role::BANK, Role::ADMIN] {
                assert_eq!(
                    policy.evaluate(&ctx(role)).unwrap(),
                    PolicyVerdict::Allow,
                    "{role} should record {action} on a {subject_type} in {state}"
                );
            }
            for role in [Role::CORPORATE, Role::AUDITOR] {
                assert!(
                    matches!(policy.evaluate(&ctx(role)).unwrap(), PolicyVerdict::Forbidden { .. }),
                    "{role} must not record {action} on a {subject_type} in {state}"
                );
            }
        }
    }

    /// The document lifecycle runs end to end under the bundled policy.
    #[test]
    fn test_document_lifecycle_is_allowed_in_order() {
        let ledger = TradeLedger::in_memory().unwrap();
        let doc = SubjectRef::document("INV-1");
        ledger
            .issue_document(&exporter(), "INV-1", "commercial_invoice", COMMERCIAL_INVOICE)
            .unwrap();
        for (action, actor) in [
            (Action::Verified, issuing_bank()),
            (Action::Shipped, issuing_bank()),
            (Action::Received, admin()),
            (Action::Paid, issuing_bank()),
        ] {
            ledger.append(AppendRequest::new(doc.clone(), action).actor(actor)).unwrap();
        }
        assert_eq!(current_state(&ledger.chain(&doc).unwrap()), "PAID");

        // Closed documents accept no further lifecycle actions.
        let result = ledger.append(AppendRequest::new(doc, Action::Amended).actor(exporter()));
        match result {
            Err(LedgerError::InvalidTransition { reason, .. }) => {
                assert!(reason.contains("document is closed"), "got: {reason}");
            }
            other => panic!("expected InvalidTransition, got {:?}", other),
        }
    }

    /// Shipping before verification is an invalid transition; a corporate
    /// verifying is forbidden.
    #[test]
    fn test_out_of_order_and_wrong_role() {
        let ledger = TradeLedger::in_memory().unwrap();
        let doc = SubjectRef::document("BL-1");
        ledger
            .issue_document(&exporter(), "BL-1", "bill_of_lading", BILL_OF_LADING)
            .unwrap();

        assert!(matches!(
            ledger.append(AppendRequest::new(doc.clone(), Action::Shipped).actor(exporter())),
            Err(LedgerError::InvalidTransition { .. })
        ));
        assert!(matches!(
            ledger.append(AppendRequest::new(doc.clone(), Action::Verified).actor(importer())),
            Err(LedgerError::Forbidden { .. })
        ));
        assert_eq!(ledger.chain(&doc).unwrap().len(), 1);
    }

    /// A document can only be issued once.
    #[test]
    fn test_double_issue_is_refused() {
        let ledger = TradeLedger::in_memory().unwrap();
        ledger
            .issue_document(&exporter(), "BL-1", "bill_of_lading", BILL_OF_LADING)
            .unwrap();
        assert!(matches!(
            ledger.issue_document(&exporter(), "BL-1", "bill_of_lading", BILL_OF_LADING),
            Err(LedgerError::InvalidTransition { .. })
        ));
    }

    /// PAID requires COMPLETED; the bundled schemas reject unknown statuses.
    #[test]
    fn test_trade_payment_rules() {
        let ledger = TradeLedger::in_memory().unwrap();
        let trade = SubjectRef::trade("T-1");
        ledger
            .append(AppendRequest::new(trade.clone(), Action::TradeCreated).actor(exporter()))
            .unwrap();

        match ledger.append(AppendRequest::new(trade.clone(), Action::Paid).actor(issuing_bank())) {
            Err(LedgerError::InvalidTransition { reason, .. }) => {
                assert_eq!(reason, "trade must be COMPLETED before payment");
            }
            other => panic!("expected InvalidTransition, got {:?}", other),
        }
        assert!(matches!(
            ledger.append(status(&trade, exporter(), "SHIPPED_MAYBE")),
            Err(LedgerError::InvalidMetadata { .. })
        ));

        ledger.append(status(&trade, exporter(), "IN_TRANSIT")).unwrap();
        ledger.append(status(&trade, importer(), "DELIVERED")).unwrap();
        ledger.append(status(&trade, issuing_bank(), "COMPLETED")).unwrap();
        let paid = ledger
            .append(AppendRequest::new(trade.clone(), Action::Paid).actor(issuing_bank()))
            .unwrap();
        assert_eq!(paid.sequence(), 4);
        assert_eq!(current_state(&ledger.chain(&trade).unwrap()), "PAID");
    }

    /// Users register freely; only admins approve them.
    #[test]
    fn test_user_onboarding() {
        let ledger = TradeLedger::in_memory().unwrap();
        let user = SubjectRef::user("corp-harbourline-retail");
        ledger
            .append(AppendRequest::new(user.clone(), Action::UserRegistered).actor(importer()))
            .unwrap();
        assert!(matches!(
            ledger.append(AppendRequest::new(user.clone(), Action::UserApproved).actor(issuing_bank())),
            Err(LedgerError::Forbidden { .. })
        ));
        ledger
            .append(AppendRequest::new(user.clone(), Action::UserApproved).actor(admin()))
            .unwrap();
    }

    // ── Hooks ─────────────────────────────────────────────────────────────────

    /// Payment and dispute reach the risk service once each, with the owner
    /// taken from metadata.
    #[test]
    fn test_risk_hook_fires_for_configured_triggers() {
        let ledger = TradeLedger::in_memory().unwrap();
        let trade = SubjectRef::trade("T-9");
        ledger
            .append(AppendRequest::new(trade.clone(), Action::TradeCreated).actor(exporter()))
            .unwrap();
        ledger.append(status(&trade, exporter(), "IN_TRANSIT")).unwrap();
        ledger
            .append(
                AppendRequest::new(trade.clone(), Action::TradeDisputed)
                    .actor(importer())
                    .meta("owner_id", "corp-meridian-textiles"),
            )
            .unwrap();
        ledger.shutdown();

        let requests = ledger.risk.requests().unwrap();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].subject_owner_id, "corp-meridian-textiles");
        assert_eq!(requests[0].subject, trade);
        assert_eq!(requests[0].sequence, 2);
    }

    // ── Integrity ─────────────────────────────────────────────────────────────

    /// A swapped file is a mismatch with one evidence entry, owned by the
    /// issuer, which in turn triggers a risk recalculation.
    #[test]
    fn test_content_tamper_end_to_end() {
        let ledger = TradeLedger::in_memory().unwrap();
        let doc = SubjectRef::document("BL-1");
        ledger
            .issue_document(&exporter(), "BL-1", "bill_of_lading", BILL_OF_LADING)
            .unwrap();
        ledger.files.replace("BL-1", FORGED_BILL_OF_LADING).unwrap();

        let first = ledger.verifier.verify_content_as(&auditor(), "BL-1").unwrap();
        let second = ledger.verifier.verify_content_as(&auditor(), "BL-1").unwrap();
        assert!(matches!(first.verdict, ContentVerdict::Mismatch { .. }));
        assert_eq!(first, second);
        assert_eq!(first.evidence_sequence, Some(1));

        let chain = ledger.chain(&doc).unwrap();
        assert_eq!(chain.len(), 2);
        assert_eq!(current_state(&chain), "ISSUED");

        ledger.shutdown();
        let requests = ledger.risk.requests().unwrap();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].subject_owner_id, "corp-meridian-textiles");
        assert!(requests[0].trigger_reason.starts_with("TAMPER_DETECTED"));
    }

    /// Editing the ledger file is caught at the edited entry.
    #[test]
    fn test_chain_tamper_on_disk_is_detected() {
        let path = std::env::temp_dir().join(format!("tradechain-ref-{}.jsonl", uuid::Uuid::new_v4()));
        let doc = SubjectRef::document("BL-1");
        {
            let ledger = TradeLedger::over(Arc::new(JsonlLedgerStore::open(&path).unwrap())).unwrap();
            ledger
                .issue_document(&exporter(), "BL-1", "bill_of_lading", BILL_OF_LADING)
                .unwrap();
            ledger
                .append(AppendRequest::new(doc.clone(), Action::Verified).actor(issuing_bank()))
                .unwrap();
            ledger.shutdown();
        }

        chain_tamper::edit_first_entry(&path, "packing_list").unwrap();
        let store = JsonlLedgerStore::open(&path).unwrap();
        let verification = verify_stored_chain(&store, &doc).unwrap();
        match verification.verdict {
            ChainVerdict::Tampered { index, kind, .. } => {
                assert_eq!(index, 0);
                assert_eq!(kind, TamperKind::HashMismatch);
            }
            other => panic!("expected Tampered, got {:?}", other),
        }
        fs::remove_file(&path).ok();
    }

    /// Racing updates: one commit, the rest conflict, the chain stays valid.
    #[test]
    fn test_race_has_a_single_winner() {
        let ledger = TradeLedger::in_memory().unwrap();
        let trade = SubjectRef::trade("T-race");
        ledger
            .append(AppendRequest::new(trade.clone(), Action::TradeCreated).actor(exporter()))
            .unwrap();

        let actors = [exporter(), importer(), issuing_bank(), admin()];
        let outcome = concurrent_append::race(&ledger, &trade, &actors, "IN_TRANSIT").unwrap();
        assert_eq!(outcome.committed.len(), 1);
        assert_eq!(outcome.conflicts, 3);
        assert!(ledger.verifier.verify_chain(&trade).unwrap().verdict.is_valid());
    }

    // ── Scenarios ─────────────────────────────────────────────────────────────

    #[test]
    fn test_all_scenarios_run() {
        crate::scenarios::document_lifecycle::run_scenario().unwrap();
        crate::scenarios::trade_settlement::run_scenario().unwrap();
        crate::scenarios::content_tamper::run_scenario().unwrap();
        crate::scenarios::chain_tamper::run_scenario().unwrap();
        crate::scenarios::concurrent_append::run_scenario().unwrap();
    }
}

//! Scenario 1: Document Lifecycle
//!
//! A bill of lading moves through its lifecycle on its own chain:
//!
//!   ISSUED → VERIFIED → AMENDED → VERIFIED → (linked to trade) → SHIPPED → RECEIVED
//!
//! Lifecycle moves after issuance are recorded by the bank. Along the way
//! the policy refuses three appends:
//! - the exporter tries to verify its own document (role not permitted)
//! - the exporter tries to record receipt (role not permitted)
//! - a second RECEIVED after receipt (not valid in the current state)
//!
//! No refusal writes anything. The finished chain replays cleanly and
//! the stored file still matches its issuance hash.

use tradechain_contracts::{
    action::Action,
    error::LedgerResult,
    request::AppendRequest,
    subject::SubjectRef,
};
use tradechain_core::entry::current_state;

use crate::{
    mock_data::{auditor, exporter, issuing_bank, BILL_OF_LADING},
    runtime::TradeLedger,
    scenarios::{print_chain, print_chain_verdict, print_refusal, short},
};

pub const DOCUMENT_ID: &str = "BL-NST-4471";
pub const TRADE_ID: &str = "T-2026-0318";

pub fn run_scenario() -> LedgerResult<()> {
    println!("=== Scenario 1: Document Lifecycle ===");
    println!();

    let ledger = TradeLedger::in_memory()?;
    let document = SubjectRef::document(DOCUMENT_ID);
    let (exporter, bank) = (exporter(), issuing_bank());

    // ── Step 1: issue ─────────────────────────────────────────────────────────
    let issued = ledger.issue_document(&exporter, DOCUMENT_ID, "bill_of_lading", BILL_OF_LADING)?;
    let recorded_hash = issued.entry_hash().to_hex();
    println!("  Document:  {}", document);
    println!("  ISSUED by {} (entry {}…)", exporter.id, short(&recorded_hash));

    // ── Step 2: bank check, amendment, re-check ───────────────────────────────
    ledger.append(AppendRequest::new(document.clone(), Action::Verified).actor(bank.clone()))?;
    ledger.append(
        AppendRequest::new(document.clone(), Action::Amended)
            .actor(bank.clone())
            .meta("field", "port_of_discharge")
            .meta("from", "Rotterdam")
            .meta("to", "Antwerp"),
    )?;

    print_refusal(
        "Exporter self-verification",
        ledger.append(AppendRequest::new(document.clone(), Action::Verified).actor(exporter.clone())),
    );

    ledger.append(AppendRequest::new(document.clone(), Action::Verified).actor(bank.clone()))?;

    // ── Step 3: link to the trade (annotation, state unchanged) ──────────────
    ledger.append(
        AppendRequest::new(document.clone(), Action::DocumentLinkedToTrade)
            .actor(exporter.clone())
            .meta("trade_id", TRADE_ID),
    )?;
    println!("  State after linking to {}: {}", TRADE_ID, current_state(&ledger.chain(&document)?));

    // ── Step 4: ship and receive ──────────────────────────────────────────────
    ledger.append(
        AppendRequest::new(document.clone(), Action::Shipped)
            .actor(bank.clone())
            .meta("vessel", "MV Nordic Star"),
    )?;

    print_refusal(
        "Receipt recorded by exporter",
        ledger.append(AppendRequest::new(document.clone(), Action::Received).actor(exporter.clone())),
    );
    ledger.append(AppendRequest::new(document.clone(), Action::Received).actor(bank.clone()))?;

    print_refusal(
        "Duplicate RECEIVED",
        ledger.append(AppendRequest::new(document.clone(), Action::Received).actor(bank.clone())),
    );

    // ── Step 5: audit ─────────────────────────────────────────────────────────
    let chain = ledger.chain(&document)?;
    println!();
    println!("  Chain ({} entries, state {}):", chain.len(), current_state(&chain));
    print_chain(&chain);
    println!();

    print_chain_verdict(&ledger.verifier.verify_chain(&document)?);
    let content = ledger.verifier.verify_content_as(&auditor(), DOCUMENT_ID)?;
    println!(
        "  Content check: {}",
        if content.verdict.is_verified() { "VERIFIED" } else { "MISMATCH" }
    );

    ledger.shutdown();
    println!("  RESULT: SUCCESS (expected)");
    println!();
    Ok(())
}

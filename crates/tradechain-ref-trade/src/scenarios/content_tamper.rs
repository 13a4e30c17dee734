//! Scenario 3: Document Content Tampering
//!
//! The ledger is intact, but someone with write access to the object store
//! swaps the stored bill of lading for a copy with a smaller quantity.
//!
//! Shown here:
//! - an auditor's content check re-hashes the stored bytes and reports
//!   MISMATCH with both hashes
//! - a TAMPER_DETECTED entry is appended once; repeating the check reuses it
//! - a corporate actor may not request the check at all
//! - an unreadable file is reported as a read error, never as tampering

use tradechain_contracts::{
    action::Action,
    error::{LedgerError, LedgerResult},
    request::AppendRequest,
    subject::SubjectRef,
    verdict::{ContentVerdict, ContentVerification},
};
use tradechain_core::entry::current_state;

use crate::{
    mock_data::{auditor, exporter, issuing_bank, BILL_OF_LADING, FORGED_BILL_OF_LADING},
    runtime::TradeLedger,
    scenarios::{print_chain, print_chain_verdict, short},
};

pub const DOCUMENT_ID: &str = "BL-NST-4471";

fn print_content(label: &str, verification: &ContentVerification) {
    match &verification.verdict {
        ContentVerdict::Verified { hash } => {
            println!("  {label}: VERIFIED ({}…)", short(&hash.to_hex()));
        }
        ContentVerdict::Mismatch {
            expected_hash,
            found_hash,
        } => {
            println!("  {label}: MISMATCH");
            println!("    expected: {}", expected_hash);
            println!("    found:    {}", found_hash);
            match verification.evidence_sequence {
                Some(sequence) => println!("    evidence: TAMPER_DETECTED #{}", sequence),
                None => println!("    evidence: not recorded"),
            }
        }
        ContentVerdict::ChainTampered { index, kind } => {
            println!("  {label}: NOT CHECKED, document chain tampered at index {index} ({kind:?})");
        }
    }
}

pub fn run_scenario() -> LedgerResult<()> {
    println!("=== Scenario 3: Document Content Tampering ===");
    println!();

    let ledger = TradeLedger::in_memory()?;
    let document = SubjectRef::document(DOCUMENT_ID);
    let (exporter, bank, auditor) = (exporter(), issuing_bank(), auditor());

    ledger.issue_document(&exporter, DOCUMENT_ID, "bill_of_lading", BILL_OF_LADING)?;
    ledger.append(AppendRequest::new(document.clone(), Action::Verified).actor(bank.clone()))?;
    ledger.append(AppendRequest::new(document.clone(), Action::Shipped).actor(bank.clone()))?;

    // ── Before tampering ──────────────────────────────────────────────────────
    let before = ledger.verifier.verify_content_as(&auditor, DOCUMENT_ID)?;
    print_content("Check before tampering", &before);

    // ── Out-of-band file swap ─────────────────────────────────────────────────
    ledger.files.replace(DOCUMENT_ID, FORGED_BILL_OF_LADING)?;
    println!("  Stored file replaced out of band (1,200 → 120 bales)");

    match ledger.verifier.verify_content_as(&exporter, DOCUMENT_ID) {
        Err(e @ LedgerError::Forbidden { .. }) => println!("  Check by exporter: REFUSED ({e})"),
        Err(e) => return Err(e),
        Ok(_) => println!("  Check by exporter: ALLOWED (unexpected)"),
    }

    let after = ledger.verifier.verify_content_as(&auditor, DOCUMENT_ID)?;
    print_content("Check after tampering", &after);

    let repeated = ledger.verifier.verify_content_as(&auditor, DOCUMENT_ID)?;
    println!(
        "  Repeated check: {}",
        if repeated == after { "same verdict, same evidence entry" } else { "DIFFERENT (unexpected)" }
    );

    // ── Ledger view ───────────────────────────────────────────────────────────
    let chain = ledger.chain(&document)?;
    println!();
    println!("  Chain ({} entries, state {}):", chain.len(), current_state(&chain));
    print_chain(&chain);
    println!();
    print_chain_verdict(&ledger.verifier.verify_chain(&document)?);

    // ── Object store outage ───────────────────────────────────────────────────
    ledger.files.remove(DOCUMENT_ID)?;
    match ledger.verifier.verify_content_as(&auditor, DOCUMENT_ID) {
        Err(e @ LedgerError::ContentReadError { .. }) => {
            println!("  Check with file missing: ERROR, retryable={} ({e})", e.is_retryable());
        }
        Err(e) => return Err(e),
        Ok(v) => print_content("Check with file missing", &v),
    }

    ledger.shutdown();
    for request in ledger.risk.requests()? {
        println!("  Risk recalculation: {} ← {}", request.subject_owner_id, request.trigger_reason);
    }
    println!("  RESULT: SUCCESS (expected)");
    println!();
    Ok(())
}

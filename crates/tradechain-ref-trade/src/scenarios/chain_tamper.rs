//! Scenario 4: Ledger Tampering
//!
//! The document file is intact, but someone with write access to the
//! ledger file edits the first entry of a chain in place, changing the
//! recorded document type.
//!
//! The JSON-lines store loads the edited line without complaint; it does
//! not re-derive hashes. Replaying the chain does: the edited entry no
//! longer hashes to its stored `entry_hash`, and replay reports index 0.

use std::{fs, path::Path};

use serde_json::Value;

use tradechain_contracts::{
    action::Action,
    error::{LedgerError, LedgerResult},
    request::AppendRequest,
    subject::SubjectRef,
};
use tradechain_store::JsonlLedgerStore;
use tradechain_verify::verify_stored_chain;

use crate::{
    mock_data::{exporter, issuing_bank, BILL_OF_LADING},
    runtime::TradeLedger,
    scenarios::{print_chain, print_chain_verdict},
};

pub const DOCUMENT_ID: &str = "BL-NST-4471";

fn storage(e: impl std::fmt::Display) -> LedgerError {
    LedgerError::Storage {
        reason: e.to_string(),
    }
}

/// Rewrite `metadata.document_type` of the first line of the ledger file.
pub fn edit_first_entry(path: &Path, document_type: &str) -> LedgerResult<()> {
    let contents = fs::read_to_string(path).map_err(storage)?;
    let mut lines: Vec<String> = contents.lines().map(str::to_string).collect();
    let first = lines
        .first_mut()
        .ok_or_else(|| storage(format!("ledger file '{}' is empty", path.display())))?;

    let mut entry: Value = serde_json::from_str(first).map_err(storage)?;
    entry["metadata"]["document_type"] = Value::from(document_type);
    *first = serde_json::to_string(&entry).map_err(storage)?;

    let mut edited = lines.join("\n");
    edited.push('\n');
    fs::write(path, edited).map_err(storage)
}

pub fn run_scenario() -> LedgerResult<()> {
    println!("=== Scenario 4: Ledger Tampering ===");
    println!();

    let path = std::env::temp_dir().join(format!("tradechain-scenario-{}.jsonl", uuid::Uuid::new_v4()));
    let document = SubjectRef::document(DOCUMENT_ID);
    println!("  Ledger file: {}", path.display());

    // ── Record a short chain on disk ──────────────────────────────────────────
    {
        let store = std::sync::Arc::new(JsonlLedgerStore::open(&path)?);
        let ledger = TradeLedger::over(store)?;
        ledger.issue_document(&exporter(), DOCUMENT_ID, "bill_of_lading", BILL_OF_LADING)?;
        ledger.append(AppendRequest::new(document.clone(), Action::Verified).actor(issuing_bank()))?;
        ledger.append(AppendRequest::new(document.clone(), Action::Shipped).actor(issuing_bank()))?;

        print_chain(&ledger.chain(&document)?);
        print_chain_verdict(&ledger.verifier.verify_chain(&document)?);
        ledger.shutdown();
    }

    // ── Edit entry 0 in place ─────────────────────────────────────────────────
    edit_first_entry(&path, "packing_list")?;
    println!("  Entry #0 edited on disk: document_type bill_of_lading → packing_list");

    // ── Reopen and replay ─────────────────────────────────────────────────────
    let reopened = JsonlLedgerStore::open(&path)?;
    let verification = verify_stored_chain(&reopened, &document)?;
    print_chain_verdict(&verification);

    fs::remove_file(&path).map_err(storage)?;
    println!(
        "  RESULT: {}",
        if verification.verdict.is_valid() { "NOT DETECTED (unexpected)" } else { "TAMPERING DETECTED (expected)" }
    );
    println!();
    Ok(())
}

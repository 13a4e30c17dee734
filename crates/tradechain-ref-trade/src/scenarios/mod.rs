//! Trade-finance reference runtime demo scenarios.
//!
//! Each scenario is a self-contained module that wires up the real
//! TRADECHAIN components through `TradeLedger` with mock documents and
//! counterparties, and demonstrates one guarantee of the ledger.

pub mod chain_tamper;
pub mod concurrent_append;
pub mod content_tamper;
pub mod document_lifecycle;
pub mod trade_settlement;

use tradechain_contracts::{
    error::LedgerResult,
    verdict::{ChainVerdict, ChainVerification},
};
use tradechain_core::ChainEntry;

/// First 16 hex characters of a digest, for display.
pub(crate) fn short(hex: &str) -> &str {
    hex.get(..16).unwrap_or(hex)
}

pub(crate) fn print_chain(entries: &[ChainEntry]) {
    for entry in entries {
        let actor = entry.actor_id().map(|a| a.0.as_str()).unwrap_or("-");
        println!(
            "    #{:<2} {:<25} {:<27} {}…",
            entry.sequence(),
            entry.action().as_str(),
            actor,
            short(&entry.entry_hash().to_hex())
        );
    }
}

/// Print the outcome of an append that the ledger is expected to refuse.
pub(crate) fn print_refusal(label: &str, result: LedgerResult<ChainEntry>) {
    match result {
        Ok(entry) => println!("  {label}: ACCEPTED as #{} (unexpected)", entry.sequence()),
        Err(e) => println!("  {label}: REFUSED ({e})"),
    }
}

pub(crate) fn print_chain_verdict(verification: &ChainVerification) {
    match &verification.verdict {
        ChainVerdict::Valid { length, .. } => {
            println!("  Chain {}: VALID ({} entries)", verification.subject, length);
        }
        ChainVerdict::Tampered {
            index,
            kind,
            expected,
            found,
        } => {
            println!("  Chain {}: TAMPERED at index {} ({:?})", verification.subject, index, kind);
            println!("    expected: {}", expected);
            println!("    found:    {}", found);
        }
    }
}

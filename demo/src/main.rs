//! TRADECHAIN Trade-Finance Reference Ledger — Demo CLI
//!
//! Runs one or all of the five trade-finance scenarios, or replays the chains
//! of an existing JSON-lines ledger file. Each scenario uses the real
//! TRADECHAIN components (policy, schema validation, chain builder, hooks,
//! integrity verifier) wired together with mock documents and counterparties.
//!
//! Usage:
//!   cargo run -p demo -- run-all
//!   cargo run -p demo -- document-lifecycle
//!   cargo run -p demo -- trade-settlement
//!   cargo run -p demo -- content-tamper
//!   cargo run -p demo -- chain-tamper
//!   cargo run -p demo -- concurrent-append
//!   cargo run -p demo -- verify-ledger --path ledger.jsonl [--subject trade/T-1]
//!
//! `verify-ledger` opens the file read-only. It exits 2 when a chain fails
//! replay and 1 when the file cannot be read.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use tradechain_contracts::{
    error::LedgerResult,
    subject::SubjectRef,
    verdict::{ChainVerdict, ChainVerification},
};
use tradechain_ref_trade::scenarios::{
    chain_tamper, concurrent_append, content_tamper, document_lifecycle, trade_settlement,
};
use tradechain_store::JsonlLedgerStore;
use tradechain_verify::{sweep, verify_stored_chain};

// ── CLI definition ────────────────────────────────────────────────────────────

/// TRADECHAIN — Hash-chained trade-finance ledger demo.
///
/// Each subcommand runs one or all of the trade-finance scenarios, or
/// verifies a ledger file on disk.
#[derive(Parser)]
#[command(
    name = "demo",
    about = "TRADECHAIN trade-finance reference ledger demo",
    long_about = "Runs TRADECHAIN demo scenarios showing lifecycle enforcement,\n\
                  optimistic concurrency, content tamper detection, and chain replay."
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run all five scenarios in sequence.
    RunAll,
    /// Scenario 1: Document Lifecycle (ordered transitions, role checks).
    DocumentLifecycle,
    /// Scenario 2: Trade Settlement (payment gating, risk hooks).
    TradeSettlement,
    /// Scenario 3: Content Tampering (re-hash, tamper evidence).
    ContentTamper,
    /// Scenario 4: Ledger Tampering (on-disk edit, chain replay).
    ChainTamper,
    /// Scenario 5: Concurrent Appends (one winner per tip).
    ConcurrentAppend,
    /// Replay the chains stored in a JSON-lines ledger file.
    VerifyLedger {
        /// Ledger file to open.
        #[arg(long)]
        path: PathBuf,
        /// Verify only this subject, e.g. `document/BL-NST-4471`.
        #[arg(long)]
        subject: Option<SubjectRef>,
    },
}

// ── Entry point ───────────────────────────────────────────────────────────────

fn main() {
    // Initialize structured logging.  Set RUST_LOG=debug for verbose output.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_target(false)
        .compact()
        .init();

    let cli = Cli::parse();

    print_banner();

    let result = match cli.command {
        Command::RunAll => run_all(),
        Command::DocumentLifecycle => document_lifecycle::run_scenario().map(|()| Outcome::Completed),
        Command::TradeSettlement => trade_settlement::run_scenario().map(|()| Outcome::Completed),
        Command::ContentTamper => content_tamper::run_scenario().map(|()| Outcome::Completed),
        Command::ChainTamper => chain_tamper::run_scenario().map(|()| Outcome::Completed),
        Command::ConcurrentAppend => concurrent_append::run_scenario().map(|()| Outcome::Completed),
        Command::VerifyLedger { path, subject } => verify_ledger(path, subject),
    };

    match result {
        Ok(Outcome::Completed) => {
            println!("All selected commands completed successfully.");
        }
        Ok(Outcome::Tampered { chains, path }) => {
            eprintln!("TAMPERED: {} chain(s) in '{}' failed replay", chains, path.display());
            std::process::exit(EXIT_TAMPERED);
        }
        Err(e) => {
            eprintln!("Demo error: {}", e);
            std::process::exit(EXIT_ERROR);
        }
    }
}

/// Exit status when a command could not run.
const EXIT_ERROR: i32 = 1;
/// Exit status when `verify-ledger` ran and found tampering.
const EXIT_TAMPERED: i32 = 2;

/// How a successful command ended.
enum Outcome {
    Completed,
    Tampered { chains: usize, path: PathBuf },
}

// ── Scenario dispatch ─────────────────────────────────────────────────────────

fn run_all() -> LedgerResult<Outcome> {
    document_lifecycle::run_scenario()?;
    trade_settlement::run_scenario()?;
    content_tamper::run_scenario()?;
    chain_tamper::run_scenario()?;
    concurrent_append::run_scenario()?;
    Ok(Outcome::Completed)
}

// ── Ledger verification ───────────────────────────────────────────────────────

/// Replay a ledger file without modifying it.
///
/// Tampering is a normal outcome here, reported as `Outcome::Tampered`; an
/// `Err` means the file could not be read at all.
fn verify_ledger(path: PathBuf, subject: Option<SubjectRef>) -> LedgerResult<Outcome> {
    let store = JsonlLedgerStore::open_read_only(&path)?;
    let verifications = match subject {
        Some(subject) => vec![verify_stored_chain(&store, &subject)?],
        None => sweep(&store)?,
    };
    info!(path = %path.display(), chains = verifications.len(), "ledger replayed");

    println!("Ledger: {}", path.display());
    for verification in &verifications {
        print_verification(verification);
    }

    let tampered = verifications.iter().filter(|v| !v.verdict.is_valid()).count();
    println!();
    println!("{} chain(s) checked, {} tampered", verifications.len(), tampered);

    if tampered > 0 {
        return Ok(Outcome::Tampered { chains: tampered, path });
    }
    Ok(Outcome::Completed)
}

fn print_verification(verification: &ChainVerification) {
    match &verification.verdict {
        ChainVerdict::Valid { length, tip_hash } => {
            let tip = tip_hash.map(|h| h.to_hex()).unwrap_or_else(|| "-".to_string());
            println!("  {:<32} VALID     {:>4} entries  tip {}", verification.subject, length, tip);
        }
        ChainVerdict::Tampered {
            index,
            kind,
            expected,
            found,
        } => {
            println!("  {:<32} TAMPERED  index {} ({:?})", verification.subject, index, kind);
            println!("    expected: {}", expected);
            println!("    found:    {}", found);
        }
    }
}

// ── Banner ────────────────────────────────────────────────────────────────────

/// What `ChainBuilder::append` does, in the order it does it.
const APPEND_STEPS: [&str; 6] = [
    "Snapshot the subject's chain and derive its current state",
    "Metadata validated against the action's JSON Schema",
    "Transition policy → Allow / Deny / Forbidden for (state, action, role)",
    "Entry sealed: SHA-256 over canonical fields + previous entry hash",
    "Store commits only if the chain tip is still the one observed",
    "Hooks (risk recalculation) run after commit, off the caller's thread",
];

fn print_banner() {
    println!();
    println!("TRADECHAIN — Hash-chained Trade-Finance Ledger");
    println!("Reference Demo");
    println!("==============================================");
    println!();
    println!("Per append:");
    for (i, step) in APPEND_STEPS.iter().enumerate() {
        println!("  [{}] {}", i + 1, step);
    }
    println!();
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use std::{fs, sync::Arc};

    use tradechain_ref_trade::{mock_data, TradeLedger};

    use super::*;

    fn temp_ledger() -> PathBuf {
        std::env::temp_dir().join(format!("tradechain-demo-{}.jsonl", uuid::Uuid::new_v4()))
    }

    /// Write a ledger holding one issued document.
    fn write_ledger(path: &std::path::Path) {
        let store = Arc::new(JsonlLedgerStore::open(path).unwrap());
        let ledger = TradeLedger::over(store).unwrap();
        ledger
            .issue_document(&mock_data::exporter(), "BL-1", "bill_of_lading", b"BILL OF LADING 1")
            .unwrap();
        ledger.shutdown();
    }

    /// A clean ledger completes.
    #[test]
    fn test_verify_ledger_clean_file_completes() {
        let path = temp_ledger();
        write_ledger(&path);
        assert!(matches!(verify_ledger(path.clone(), None), Ok(Outcome::Completed)));
        fs::remove_file(&path).ok();
    }

    /// A tampered ledger is its own outcome, distinct from an error, and the
    /// file is left byte-for-byte as found, torn tail included.
    #[test]
    fn test_verify_ledger_reports_tampering_without_writing() {
        let path = temp_ledger();
        write_ledger(&path);
        let mut edited = fs::read_to_string(&path).unwrap().replace("bill_of_lading", "invoice");
        edited.push_str(r#"{"schema_version":1,"seq"#);
        fs::write(&path, &edited).unwrap();

        match verify_ledger(path.clone(), None) {
            Ok(Outcome::Tampered { chains, .. }) => assert_eq!(chains, 1),
            Ok(Outcome::Completed) => panic!("expected Tampered, got Completed"),
            Err(e) => panic!("expected Tampered, got error {e}"),
        }
        assert_eq!(fs::read_to_string(&path).unwrap(), edited);
        fs::remove_file(&path).ok();
    }

    /// A missing file is an error and is not created.
    #[test]
    fn test_verify_ledger_missing_file_is_an_error() {
        let path = temp_ledger();
        assert!(verify_ledger(path.clone(), None).is_err());
        assert!(!path.exists());
    }

    #[test]
    fn test_banner_lists_metadata_validation_before_policy() {
        let position = |needle: &str| APPEND_STEPS.iter().position(|s| s.contains(needle)).unwrap();
        assert!(position("JSON Schema") < position("Transition policy"));
        assert!(position("Transition policy") < position("sealed"));
    }

    #[test]
    fn test_exit_codes_are_distinct() {
        assert_ne!(EXIT_ERROR, EXIT_TAMPERED);
        assert_ne!(EXIT_TAMPERED, 0);
    }
}

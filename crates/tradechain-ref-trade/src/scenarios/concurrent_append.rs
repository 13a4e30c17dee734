//! Scenario 5: Concurrent Appends
//!
//! Several parties update the same trade at the same moment. Each seals its
//! entry against the tip it observed, then all commit together.
//!
//! Exactly one commit wins. Every other one gets `ConcurrentModification`
//! and nothing is written for it, so the chain stays linear. A loser that
//! still wants its update re-reads the chain and tries again.

use std::{sync::Barrier, thread};

use tradechain_contracts::{
    action::Action,
    error::{LedgerError, LedgerResult},
    request::AppendRequest,
    subject::{Actor, SubjectRef},
};
use tradechain_core::ChainEntry;

use crate::{
    mock_data::{admin, exporter, importer, issuing_bank},
    runtime::TradeLedger,
    scenarios::{print_chain, print_chain_verdict},
};

pub const TRADE_ID: &str = "T-2026-0320";

/// How many parties race for the same tip.
pub const CONTENDERS: usize = 4;

/// Outcome of one racing round.
pub struct RaceOutcome {
    pub committed: Vec<ChainEntry>,
    pub conflicts: usize,
}

/// Seal one update per actor against the current tip, then commit them all
/// at once from separate threads.
pub fn race(ledger: &TradeLedger, trade: &SubjectRef, actors: &[Actor], status: &str) -> LedgerResult<RaceOutcome> {
    let barrier = Barrier::new(actors.len());
    let builder = &ledger.builder;

    let results: Vec<LedgerResult<ChainEntry>> = thread::scope(|scope| {
        let handles: Vec<_> = actors
            .iter()
            .map(|actor| {
                let barrier = &barrier;
                scope.spawn(move || {
                    let prepared = builder.prepare(
                        AppendRequest::new(trade.clone(), Action::TradeStatusUpdated)
                            .actor(actor.clone())
                            .meta("status", status),
                    );
                    barrier.wait();
                    builder.commit(prepared?)
                })
            })
            .collect();

        handles
            .into_iter()
            .map(|handle| {
                handle.join().unwrap_or_else(|_| {
                    Err(LedgerError::Storage {
                        reason: "append worker panicked".to_string(),
                    })
                })
            })
            .collect()
    });

    let mut outcome = RaceOutcome {
        committed: Vec::new(),
        conflicts: 0,
    };
    for result in results {
        match result {
            Ok(entry) => outcome.committed.push(entry),
            Err(LedgerError::ConcurrentModification { .. }) => outcome.conflicts += 1,
            Err(e) => return Err(e),
        }
    }
    Ok(outcome)
}

pub fn run_scenario() -> LedgerResult<()> {
    println!("=== Scenario 5: Concurrent Appends ===");
    println!();

    let ledger = TradeLedger::in_memory()?;
    let trade = SubjectRef::trade(TRADE_ID);
    ledger.append(AppendRequest::new(trade.clone(), Action::TradeCreated).actor(exporter()))?;

    let actors = [exporter(), importer(), issuing_bank(), admin()];
    println!("  {} parties update {} from the same tip", CONTENDERS, trade);

    let outcome = race(&ledger, &trade, &actors[..CONTENDERS], "IN_TRANSIT")?;
    println!(
        "  Committed: {}  Conflicts: {}",
        outcome.committed.len(),
        outcome.conflicts
    );
    for entry in &outcome.committed {
        let winner = entry.actor_id().map(|a| a.0.as_str()).unwrap_or("-");
        println!("  Winner: {} as #{}", winner, entry.sequence());
    }

    // ── A loser retries against the new tip ───────────────────────────────────
    let retry = ledger.append(
        AppendRequest::new(trade.clone(), Action::TradeStatusUpdated)
            .actor(importer())
            .meta("status", "DELIVERED"),
    )?;
    println!("  Retry after re-reading the chain: committed as #{}", retry.sequence());

    let chain = ledger.chain(&trade)?;
    println!();
    print_chain(&chain);
    println!();
    print_chain_verdict(&ledger.verifier.verify_chain(&trade)?);

    ledger.shutdown();
    println!("  RESULT: SUCCESS (expected)");
    println!();
    Ok(())
}

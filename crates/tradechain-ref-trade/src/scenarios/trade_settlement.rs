//! Scenario 2: Trade Settlement
//!
//! Two trades between the same counterparties:
//!
//!   Trade A: TRADE_CREATED → IN_TRANSIT → DELIVERED → COMPLETED → PAID
//!   Trade B: TRADE_CREATED → IN_TRANSIT → TRADE_DISPUTED
//!
//! Shown here:
//! - PAID before COMPLETED is refused as an invalid transition
//! - PAID by a corporate actor is refused as forbidden for the role
//! - PAID and TRADE_DISPUTED trigger risk recalculation through the event
//!   hook, after the append has committed and off the caller's thread

use tradechain_contracts::{
    action::Action,
    error::LedgerResult,
    request::AppendRequest,
    subject::{Actor, SubjectRef},
};
use tradechain_core::entry::current_state;

use crate::{
    mock_data::{exporter, importer, issuing_bank},
    runtime::TradeLedger,
    scenarios::{print_chain, print_chain_verdict, print_refusal},
};

pub const SETTLED_TRADE: &str = "T-2026-0318";
pub const DISPUTED_TRADE: &str = "T-2026-0319";

fn status(trade: &SubjectRef, actor: &Actor, status: &str) -> AppendRequest {
    AppendRequest::new(trade.clone(), Action::TradeStatusUpdated)
        .actor(actor.clone())
        .meta("status", status)
}

pub fn run_scenario() -> LedgerResult<()> {
    println!("=== Scenario 2: Trade Settlement ===");
    println!();

    let ledger = TradeLedger::in_memory()?;
    let (exporter, importer, bank) = (exporter(), importer(), issuing_bank());

    // ── Trade A: settle ───────────────────────────────────────────────────────
    let trade_a = SubjectRef::trade(SETTLED_TRADE);
    println!("  Trade A: {}", trade_a);

    ledger.append(
        AppendRequest::new(trade_a.clone(), Action::TradeCreated)
            .actor(exporter.clone())
            .meta("buyer", importer.id.0.clone())
            .meta("amount", "495000.00")
            .meta("currency", "USD"),
    )?;

    print_refusal(
        "Early payment",
        ledger.append(AppendRequest::new(trade_a.clone(), Action::Paid).actor(bank.clone())),
    );

    ledger.append(status(&trade_a, &exporter, "IN_TRANSIT"))?;
    ledger.append(status(&trade_a, &importer, "DELIVERED"))?;
    ledger.append(status(&trade_a, &bank, "COMPLETED"))?;

    print_refusal(
        "Payment by importer",
        ledger.append(AppendRequest::new(trade_a.clone(), Action::Paid).actor(importer.clone())),
    );

    let paid = ledger.append(
        AppendRequest::new(trade_a.clone(), Action::Paid)
            .actor(bank.clone())
            .meta("owner_id", importer.id.0.clone())
            .meta("amount", "495000.00"),
    )?;
    println!("  PAID recorded as #{}", paid.sequence());

    let chain_a = ledger.chain(&trade_a)?;
    println!("  Chain ({} entries, state {}):", chain_a.len(), current_state(&chain_a));
    print_chain(&chain_a);
    println!();

    // ── Trade B: dispute ──────────────────────────────────────────────────────
    let trade_b = SubjectRef::trade(DISPUTED_TRADE);
    println!("  Trade B: {}", trade_b);

    ledger.append(AppendRequest::new(trade_b.clone(), Action::TradeCreated).actor(exporter.clone()))?;
    ledger.append(status(&trade_b, &exporter, "IN_TRANSIT"))?;
    ledger.append(
        AppendRequest::new(trade_b.clone(), Action::TradeDisputed)
            .actor(importer.clone())
            .meta("owner_id", exporter.id.0.clone())
            .meta("reason", "short shipment: 1,150 of 1,200 bales received"),
    )?;

    let chain_b = ledger.chain(&trade_b)?;
    println!("  Chain ({} entries, state {}):", chain_b.len(), current_state(&chain_b));
    print_chain(&chain_b);
    println!();

    // ── Risk hooks ────────────────────────────────────────────────────────────
    // Shutdown drains the hook queue so every notification has landed.
    ledger.shutdown();
    let requests = ledger.risk.requests()?;
    println!("  Risk recalculations requested: {}", requests.len());
    for request in &requests {
        println!("    {} ← {}", request.subject_owner_id, request.trigger_reason);
    }

    print_chain_verdict(&ledger.verifier.verify_chain(&trade_a)?);
    print_chain_verdict(&ledger.verifier.verify_chain(&trade_b)?);
    println!("  RESULT: SUCCESS (expected)");
    println!();
    Ok(())
}

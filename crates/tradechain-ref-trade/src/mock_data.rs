//! Simulated collaborators and trade-finance data for the reference runtime.
//!
//! All data in this module is hardcoded and fictional. No external systems
//! are contacted. `MockFileStore` stands in for the document object store
//! and `RecordingRiskService` for the counterparty risk engine.

use std::{
    collections::HashMap,
    sync::{Mutex, PoisonError},
};

use tracing::info;

use tradechain_contracts::{
    error::{LedgerError, LedgerResult},
    risk::RiskRecalculationRequest,
    subject::{Actor, Role},
};
use tradechain_core::traits::{FileStore, RiskRecalculator};

fn poisoned<T>(e: PoisonError<T>) -> LedgerError {
    LedgerError::Storage {
        reason: format!("mock collaborator lock poisoned: {}", e),
    }
}

// ── Document object store (mock) ──────────────────────────────────────────────

/// In-memory document bytes keyed by document id.
///
/// `replace` and `remove` exist so scenarios can simulate an attacker with
/// write access to the object store, or an outage.
#[derive(Default)]
pub struct MockFileStore {
    files: Mutex<HashMap<String, Vec<u8>>>,
}

impl MockFileStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `bytes` as the file for `document_id`.
    pub fn put(&self, document_id: &str, bytes: &[u8]) -> LedgerResult<()> {
        self.files
            .lock()
            .map_err(poisoned)?
            .insert(document_id.to_string(), bytes.to_vec());
        Ok(())
    }

    /// Overwrite a stored file out of band, bypassing the ledger.
    pub fn replace(&self, document_id: &str, bytes: &[u8]) -> LedgerResult<()> {
        self.put(document_id, bytes)
    }

    /// Make a stored file unreadable.
    pub fn remove(&self, document_id: &str) -> LedgerResult<()> {
        self.files.lock().map_err(poisoned)?.remove(document_id);
        Ok(())
    }
}

impl FileStore for MockFileStore {
    fn read_bytes(&self, document_id: &str) -> LedgerResult<Vec<u8>> {
        self.files
            .lock()
            .map_err(poisoned)?
            .get(document_id)
            .cloned()
            .ok_or_else(|| LedgerError::ContentReadError {
                document_id: document_id.to_string(),
                reason: "no object stored under this id".to_string(),
            })
    }
}

// ── Risk service (mock) ───────────────────────────────────────────────────────

/// Records every recalculation request instead of rescoring anyone.
#[derive(Default)]
pub struct RecordingRiskService {
    requests: Mutex<Vec<RiskRecalculationRequest>>,
}

impl RecordingRiskService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every request received so far, in arrival order.
    pub fn requests(&self) -> LedgerResult<Vec<RiskRecalculationRequest>> {
        Ok(self.requests.lock().map_err(poisoned)?.clone())
    }
}

impl RiskRecalculator for RecordingRiskService {
    fn recalculate(&self, request: &RiskRecalculationRequest) -> LedgerResult<()> {
        info!(
            owner = %request.subject_owner_id,
            reason = %request.trigger_reason,
            "risk recalculation requested"
        );
        self.requests.lock().map_err(poisoned)?.push(request.clone());
        Ok(())
    }
}

// ── Actors ────────────────────────────────────────────────────────────────────

/// The exporter, which originates documents and trades.
pub fn exporter() -> Actor {
    Actor::new("corp-meridian-textiles", Role::CORPORATE)
}

/// The importer on the other side of the trade.
pub fn importer() -> Actor {
    Actor::new("corp-harbourline-retail", Role::CORPORATE)
}

/// The issuing bank, which checks documents and settles payment.
pub fn issuing_bank() -> Actor {
    Actor::new("bank-northsea-trade", Role::BANK)
}

pub fn auditor() -> Actor {
    Actor::new("audit-compliance-01", Role::AUDITOR)
}

pub fn admin() -> Actor {
    Actor::new("admin-ops", Role::ADMIN)
}

// ── Documents ─────────────────────────────────────────────────────────────────

pub const BILL_OF_LADING: &[u8] = b"BILL OF LADING No. NST-4471\n\
Shipper: Meridian Textiles Ltd\n\
Consignee: Harbourline Retail BV\n\
Vessel: MV Nordic Star  Port of loading: Chittagong  Port of discharge: Rotterdam\n\
Goods: 1,200 bales combed cotton yarn, gross weight 218,400 kg\n";

/// The same bill of lading with the quantity quietly changed.
pub const FORGED_BILL_OF_LADING: &[u8] = b"BILL OF LADING No. NST-4471\n\
Shipper: Meridian Textiles Ltd\n\
Consignee: Harbourline Retail BV\n\
Vessel: MV Nordic Star  Port of loading: Chittagong  Port of discharge: Rotterdam\n\
Goods: 120 bales combed cotton yarn, gross weight 21,840 kg\n";

pub const COMMERCIAL_INVOICE: &[u8] = b"COMMERCIAL INVOICE MT-2026-0318\n\
Seller: Meridian Textiles Ltd  Buyer: Harbourline Retail BV\n\
1,200 bales combed cotton yarn @ USD 412.50 = USD 495,000.00  Incoterms: CIF Rotterdam\n";

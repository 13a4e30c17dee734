//! # tradechain-store
//!
//! Append-only `LedgerStore` implementations for the TRADECHAIN ledger.
//!
//! ## Overview
//!
//! Both stores implement the compare-and-swap append that keeps chains
//! linear: an entry is stored only if the subject's tip is still the one
//! it was sealed against. Neither store offers update or delete.
//!
//! - [`InMemoryLedgerStore`] — per-subject locks, for tests and embedding
//! - [`JsonlLedgerStore`] — one JSON object per line, fsync'd per append
//!
//! ## Usage
//!
//! ```rust,ignore
//! use tradechain_store::JsonlLedgerStore;
//!
//! let store = Arc::new(JsonlLedgerStore::open("ledger.jsonl")?);
//! let builder = ChainBuilder::new(store, policy);
//! ```

pub mod jsonl;
pub mod memory;
mod tip;

pub use jsonl::JsonlLedgerStore;
pub use memory::InMemoryLedgerStore;

// ── Tests ─────────────────────────────────────────────────────────────────────

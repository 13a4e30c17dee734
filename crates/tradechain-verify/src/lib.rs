//! # tradechain-verify
//!
//! Integrity verification for the TRADECHAIN ledger.
//!
//! ## Overview
//!
//! - [`verify_entries`] replays a chain from stored fields alone and reports
//!   the first tampered entry.
//! - [`IntegrityVerifier`] runs chain replays against a store and re-hashes
//!   stored document files, recording `TAMPER_DETECTED` evidence on a
//!   content mismatch.
//! - [`MetadataSchemaValidator`] checks entry metadata against per-action
//!   JSON Schemas before an append.
//!
//! Tampering is reported as a verdict value. An `Err` from this crate means
//! a check could not be performed, never that it failed.

pub mod chain;
pub mod engine;
pub mod schema;

pub use chain::{sweep, verify_entries, verify_stored_chain};
pub use engine::IntegrityVerifier;
pub use schema::MetadataSchemaValidator;

// ── Tests ─────────────────────────────────────────────────────────────────────

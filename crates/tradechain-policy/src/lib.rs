//! # tradechain-policy
//!
//! A TOML-driven, deny-by-default transition policy for the TRADECHAIN
//! ledger.
//!
//! ## Overview
//!
//! [`TomlTransitionPolicy`] implements the
//! [`TransitionPolicy`](tradechain_core::traits::TransitionPolicy) trait.
//! Lifecycle rules are declared in a TOML file, evaluated in order, and the
//! first matching rule wins. If no rule matches, the append is denied.
//!
//! ## Rule matching
//!
//! Each rule names a `subject_type`, an `action` and the `after` states the
//! subject must be in. `subject_type` and `action` accept the wildcard
//! `"*"`. In `after`, `"GENESIS"` means an empty chain and `"*"` means any
//! state other than genesis.

pub mod engine;
pub mod rule;

pub use engine::TomlTransitionPolicy;
pub use rule::{AccessConfig, PolicyConfig, RuleVerdict, TransitionRule};

// ── Tests ─────────────────────────────────────────────────────────────────────

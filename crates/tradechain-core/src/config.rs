//! Ledger runtime configuration.
//!
//! Loaded from TOML. Every key has a default, so an empty document is a
//! valid configuration:
//!
//! ```toml
//! [builder]
//! idempotency_window_secs = 300
//!
//! [hooks]
//! max_attempts = 3
//! retry_backoff_ms = 50
//! risk_triggers = ["PAID", "CANCELLED", "TRADE_DISPUTED", "TAMPER_DETECTED"]
//!
//! [integrity]
//! record_tamper_evidence = true
//! system_actor = "system:integrity-verifier"
//! ```

use std::{path::Path, time::Duration};

use serde::{Deserialize, Serialize};

use tradechain_contracts::{
    action::Action,
    error::{LedgerError, LedgerResult},
};

/// Top-level configuration for a ledger runtime.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    pub builder: BuilderSettings,
    pub hooks: HookSettings,
    pub integrity: IntegritySettings,
}

impl LedgerConfig {
    /// Parse `s` as TOML.
    ///
    /// Returns `LedgerError::ConfigError` on malformed TOML or unknown
    /// action tags.
    pub fn from_toml_str(s: &str) -> LedgerResult<Self> {
        toml::from_str(s).map_err(|e| LedgerError::ConfigError {
            reason: format!("failed to parse ledger config TOML: {}", e),
        })
    }

    /// Read and parse the TOML file at `path`.
    pub fn from_file(path: &Path) -> LedgerResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| LedgerError::ConfigError {
            reason: format!("failed to read ledger config '{}': {}", path.display(), e),
        })?;
        Self::from_toml_str(&contents)
    }
}

/// Chain builder settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BuilderSettings {
    /// How long a committed idempotency key collapses duplicates.
    /// Zero disables duplicate detection.
    pub idempotency_window_secs: u64,
}

impl BuilderSettings {
    pub fn idempotency_window(&self) -> Duration {
        Duration::from_secs(self.idempotency_window_secs)
    }
}

impl Default for BuilderSettings {
    fn default() -> Self {
        Self {
            idempotency_window_secs: 300,
        }
    }
}

/// Event hook dispatch settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HookSettings {
    /// Attempts per hook per entry, including the first. At least 1.
    pub max_attempts: u32,
    /// Delay before retry *n* is `n * retry_backoff_ms`.
    pub retry_backoff_ms: u64,
    /// Actions that trigger risk recalculation.
    pub risk_triggers: Vec<Action>,
}

impl Default for HookSettings {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            retry_backoff_ms: 50,
            risk_triggers: vec![
                Action::Paid,
                Action::Cancelled,
                Action::TradeDisputed,
                Action::TamperDetected,
            ],
        }
    }
}

/// Integrity verifier settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IntegritySettings {
    /// Append a `TAMPER_DETECTED` entry when a content check fails.
    pub record_tamper_evidence: bool,
    /// Actor id used for verifier-generated entries.
    pub system_actor: String,
}

impl Default for IntegritySettings {
    fn default() -> Self {
        Self {
            record_tamper_evidence: true,
            system_actor: "system:integrity-verifier".to_string(),
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_yields_defaults() {
        let config = LedgerConfig::from_toml_str("").unwrap();
        assert_eq!(config.builder.idempotency_window_secs, 300);
        assert_eq!(config.hooks.max_attempts, 3);
        assert!(config.hooks.risk_triggers.contains(&Action::TradeDisputed));
        assert!(config.integrity.record_tamper_evidence);
    }

    #[test]
    fn partial_sections_override_only_given_keys() {
        let config = LedgerConfig::from_toml_str(
            r#"
            [hooks]
            risk_triggers = ["PAID"]

            [integrity]
            record_tamper_evidence = false
            "#,
        )
        .unwrap();

        assert_eq!(config.hooks.risk_triggers, vec![Action::Paid]);
        assert_eq!(config.hooks.retry_backoff_ms, 50);
        assert!(!config.integrity.record_tamper_evidence);
        assert_eq!(config.integrity.system_actor, "system:integrity-verifier");
    }

    #[test]
    fn unknown_trigger_is_a_config_error() {
        let result = LedgerConfig::from_toml_str(
            r#"
            [hooks]
            risk_triggers = ["REFUNDED"]
            "#,
        );
        match result {
            Err(LedgerError::ConfigError { reason }) => {
                assert!(reason.contains("failed to parse ledger config TOML"));
            }
            other => panic!("expected ConfigError, got {other:?}"),
        }
    }
}

//! Per-action JSON Schema validation of entry metadata.
//!
//! `MetadataSchemaValidator` implements the `MetadataValidator` trait from
//! tradechain-core. Each action may have one compiled schema; actions
//! without one accept any metadata. All violations are collected into a
//! single `InvalidMetadata` error so the caller sees the full set at once.

use std::collections::HashMap;

use serde_json::{json, Value};
use tracing::warn;

use tradechain_contracts::{
    action::Action,
    error::{LedgerError, LedgerResult},
    request::Metadata,
};
use tradechain_core::traits::MetadataValidator;

const HEX_DIGEST: &str = "^[0-9a-f]{64}$";

/// Trade statuses accepted by `TRADE_STATUS_UPDATED`.
pub const TRADE_STATUSES: [&str; 5] = ["PENDING", "IN_TRANSIT", "DELIVERED", "COMPLETED", "DISPUTED"];

pub struct MetadataSchemaValidator {
    schemas: HashMap<Action, jsonschema::Validator>,
}

impl MetadataSchemaValidator {
    /// A validator with no schemas: every payload passes.
    pub fn new() -> Self {
        Self {
            schemas: HashMap::new(),
        }
    }

    /// A validator preloaded with the trade-finance schemas for `ISSUED`,
    /// `TRADE_STATUS_UPDATED`, `TAMPER_DETECTED` and
    /// `DOCUMENT_LINKED_TO_TRADE`.
    pub fn with_default_schemas() -> LedgerResult<Self> {
        let mut validator = Self::new();
        validator.register(
            Action::Issued,
            &json!({
                "type": "object",
                "required": ["hash", "document_type"],
                "properties": {
                    "hash": { "type": "string", "pattern": HEX_DIGEST },
                    "document_type": { "type": "string", "minLength": 1 }
                }
            }),
        )?;
        validator.register(
            Action::TradeStatusUpdated,
            &json!({
                "type": "object",
                "required": ["status"],
                "properties": {
                    "status": { "enum": TRADE_STATUSES }
                }
            }),
        )?;
        validator.register(
            Action::TamperDetected,
            &json!({
                "type": "object",
                "required": ["expected_hash", "found_hash"],
                "properties": {
                    "expected_hash": { "type": "string", "pattern": HEX_DIGEST },
                    "found_hash": { "type": "string", "pattern": HEX_DIGEST }
                }
            }),
        )?;
        validator.register(
            Action::DocumentLinkedToTrade,
            &json!({
                "type": "object",
                "required": ["trade_id"],
                "properties": {
                    "trade_id": { "type": "string", "minLength": 1 }
                }
            }),
        )?;
        Ok(validator)
    }

    /// Compile `schema` and use it for `action`, replacing any earlier one.
    ///
    /// Returns `ConfigError` if `schema` is not a valid JSON Schema.
    pub fn register(&mut self, action: Action, schema: &Value) -> LedgerResult<()> {
        let compiled = jsonschema::validator_for(schema).map_err(|e| LedgerError::ConfigError {
            reason: format!("invalid metadata schema for {}: {}", action, e),
        })?;
        self.schemas.insert(action, compiled);
        Ok(())
    }
}

impl Default for MetadataSchemaValidator {
    fn default() -> Self {
        Self::new()
    }
}

impl MetadataValidator for MetadataSchemaValidator {
    fn validate(&self, action: Action, metadata: &Metadata) -> LedgerResult<()> {
        let Some(schema) = self.schemas.get(&action) else {
            return Ok(());
        };

        let instance = Value::Object(metadata.iter().map(|(k, v)| (k.clone(), v.clone())).collect());
        let violations: Vec<String> = schema
            .iter_errors(&instance)
            .map(|error| format!("at '{}': {}", error.instance_path, error))
            .collect();

        if violations.is_empty() {
            return Ok(());
        }

        let reason = violations.join("; ");
        warn!(action = %action, %reason, "metadata rejected");
        Err(LedgerError::InvalidMetadata {
            action: action.to_string(),
            reason,
        })
    }
}

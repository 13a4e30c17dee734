//! TOML-driven transition policy.
//!
//! `TomlTransitionPolicy` loads a `PolicyConfig` from a TOML string or file
//! and implements the `TransitionPolicy` trait from tradechain-core.
//!
//! Evaluation algorithm:
//!
//! 1. Iterate rules in declaration order.
//! 2. For the first rule whose subject type, action and `after` states match:
//!    a. A `deny` rule returns `Deny` with its reason.
//!    b. An `allow` rule returns `Forbidden` if the actor's role is not in
//!       `roles`, otherwise `Allow`.
//! 3. If no rule matched, return `Deny` ("denied by default").

use std::path::Path;

use tracing::{debug, warn};

use tradechain_contracts::{
    error::{LedgerError, LedgerResult},
    policy::{PolicyVerdict, TransitionContext},
    subject::Role,
};
use tradechain_core::traits::TransitionPolicy;

use crate::rule::{PolicyConfig, RuleVerdict};

/// A `TransitionPolicy` that reads its rules from a TOML document.
///
/// ```rust,ignore
/// use tradechain_policy::TomlTransitionPolicy;
///
/// let policy = TomlTransitionPolicy::from_file(Path::new("policies/trade_finance.toml"))?;
/// ```
#[derive(Debug)]
pub struct TomlTransitionPolicy {
    config: PolicyConfig,
}

impl TomlTransitionPolicy {
    /// Parse `s` as TOML.
    ///
    /// Returns `LedgerError::ConfigError` if the TOML is malformed or does
    /// not match the `PolicyConfig` schema.
    pub fn from_toml_str(s: &str) -> LedgerResult<Self> {
        let config: PolicyConfig = toml::from_str(s).map_err(|e| LedgerError::ConfigError {
            reason: format!("failed to parse policy TOML: {}", e),
        })?;
        Ok(Self { config })
    }

    /// Read the file at `path` and parse it as a policy.
    pub fn from_file(path: &Path) -> LedgerResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| LedgerError::ConfigError {
            reason: format!("failed to read policy file '{}': {}", path.display(), e),
        })?;
        Self::from_toml_str(&contents)
    }

    pub fn config(&self) -> &PolicyConfig {
        &self.config
    }
}

impl TransitionPolicy for TomlTransitionPolicy {
    fn evaluate(&self, ctx: &TransitionContext) -> LedgerResult<PolicyVerdict> {
        debug!(
            subject_type = %ctx.subject_type,
            subject_id = %ctx.subject_id,
            action = %ctx.action,
            state = %ctx.current_state,
            role = %ctx.role,
            "evaluating transition policy"
        );

        let Some(rule) = self.config.rules.iter().find(|r| r.matches(ctx)) else {
            warn!(
                subject_type = %ctx.subject_type,
                action = %ctx.action,
                state = %ctx.current_state,
                "no transition rule matched; denying by default"
            );
            return Ok(PolicyVerdict::Deny {
                reason: format!(
                    "denied by default: no rule allows {} on a {} in state {}",
                    ctx.action, ctx.subject_type, ctx.current_state
                ),
            });
        };

        debug!(rule_id = %rule.id, action = %ctx.action, "rule matched");

        let verdict = match rule.verdict {
            RuleVerdict::Deny => PolicyVerdict::Deny {
                reason: rule
                    .deny_reason
                    .clone()
                    .unwrap_or_else(|| format!("denied by rule '{}'", rule.id)),
            },
            RuleVerdict::Allow if !rule.permits_role(&ctx.role) => {
                warn!(rule_id = %rule.id, role = %ctx.role, "role not listed on matching rule");
                PolicyVerdict::Forbidden {
                    reason: format!(
                        "rule '{}' permits roles [{}], not '{}'",
                        rule.id,
                        rule.roles.join(", "),
                        ctx.role
                    ),
                }
            }
            RuleVerdict::Allow => PolicyVerdict::Allow,
        };
        Ok(verdict)
    }

    fn may_verify_content(&self, role: &Role) -> bool {
        self.config
            .access
            .verify_content_roles
            .iter()
            .any(|r| r == role.as_str())
    }
}

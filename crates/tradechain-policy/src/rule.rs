//! Transition rule types and configuration schema.
//!
//! A `PolicyConfig` is deserialized from TOML and holds an ordered list of
//! `TransitionRule`s plus the access settings for integrity checks. Rules
//! are evaluated in declaration order and the first matching rule wins. If
//! no rule matches, the policy denies by default.

use serde::{Deserialize, Serialize};

use tradechain_contracts::{
    policy::{TransitionContext, GENESIS_STATE},
    subject::Role,
};

/// Matches any value in `subject_type`, `action` and `after`.
pub const WILDCARD: &str = "*";

/// The decision a rule produces when it matches.
///
/// ```toml
/// verdict = "allow"
/// verdict = "deny"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RuleVerdict {
    Allow,
    Deny,
}

/// A single lifecycle rule loaded from TOML.
///
/// A rule matches an append when its `subject_type`, `action` and `after`
/// patterns all match. Its `roles` list is not part of matching: a matched
/// `allow` rule whose roles exclude the actor yields `Forbidden` rather
/// than falling through to later rules.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransitionRule {
    /// Stable identifier used in logs and deny reasons.
    pub id: String,

    #[serde(default)]
    pub description: String,

    /// `document`, `trade`, `user`, or `"*"`.
    pub subject_type: String,

    /// Action tag such as `"PAID"`, or `"*"`.
    pub action: String,

    /// States the subject must currently be in.
    ///
    /// `"GENESIS"` matches an empty chain, `"*"` matches any non-empty
    /// chain, and an empty list matches every state.
    #[serde(default)]
    pub after: Vec<String>,

    /// Roles allowed to perform the action. Empty means any role.
    #[serde(default)]
    pub roles: Vec<String>,

    pub verdict: RuleVerdict,

    /// Used when `verdict = "deny"`.
    pub deny_reason: Option<String>,
}

impl TransitionRule {
    /// Return true if this rule applies to the append described by `ctx`.
    pub fn matches(&self, ctx: &TransitionContext) -> bool {
        let subject_matches =
            self.subject_type == WILDCARD || self.subject_type == ctx.subject_type.as_str();
        let action_matches = self.action == WILDCARD || self.action == ctx.action.as_str();
        subject_matches && action_matches && self.state_matches(ctx)
    }

    fn state_matches(&self, ctx: &TransitionContext) -> bool {
        if self.after.is_empty() {
            return true;
        }
        self.after.iter().any(|state| match state.as_str() {
            WILDCARD => !ctx.is_genesis(),
            GENESIS_STATE => ctx.is_genesis(),
            label => !ctx.is_genesis() && label == ctx.current_state,
        })
    }

    /// Return true if `role` may act under this rule.
    pub fn permits_role(&self, role: &str) -> bool {
        self.roles.is_empty() || self.roles.iter().any(|r| r == role)
    }
}

/// Who may request integrity checks.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AccessConfig {
    pub verify_content_roles: Vec<String>,
}

impl Default for AccessConfig {
    fn default() -> Self {
        Self {
            verify_content_roles: vec![Role::AUDITOR.to_string(), Role::ADMIN.to_string()],
        }
    }
}

/// The top-level structure deserialized from a TOML policy file.
///
/// ```toml
/// [access]
/// verify_content_roles = ["auditor", "admin"]
///
/// [[rules]]
/// id = "paid-after-completed"
/// description = "A trade is paid only once it is COMPLETED"
/// subject_type = "trade"
/// action = "PAID"
/// after = ["COMPLETED"]
/// roles = ["bank"]
/// verdict = "allow"
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolicyConfig {
    #[serde(default)]
    pub access: AccessConfig,

    /// Ordered list of rules. First match wins.
    #[serde(default)]
    pub rules: Vec<TransitionRule>,
}

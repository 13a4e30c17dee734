//! The action tags recorded on chain entries.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::error::LedgerError;

/// A state-changing action recorded in the ledger.
///
/// Every variant maps to a fixed validity rule in the transition policy.
/// The wire form is SCREAMING_SNAKE_CASE and is part of the hashed encoding,
/// so existing tags must never be renamed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[non_exhaustive]
pub enum Action {
    Issued,
    Verified,
    Amended,
    Shipped,
    Received,
    Paid,
    Cancelled,
    TradeCreated,
    TradeStatusUpdated,
    DocumentLinkedToTrade,
    TradeDisputed,
    UserRegistered,
    UserApproved,
    IntegrityCheckCompleted,
    TamperDetected,
}

impl Action {
    /// Every known action, in declaration order.
    pub const ALL: [Action; 15] = [
        Self::Issued,
        Self::Verified,
        Self::Amended,
        Self::Shipped,
        Self::Received,
        Self::Paid,
        Self::Cancelled,
        Self::TradeCreated,
        Self::TradeStatusUpdated,
        Self::DocumentLinkedToTrade,
        Self::TradeDisputed,
        Self::UserRegistered,
        Self::UserApproved,
        Self::IntegrityCheckCompleted,
        Self::TamperDetected,
    ];

    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Issued => "ISSUED",
            Self::Verified => "VERIFIED",
            Self::Amended => "AMENDED",
            Self::Shipped => "SHIPPED",
            Self::Received => "RECEIVED",
            Self::Paid => "PAID",
            Self::Cancelled => "CANCELLED",
            Self::TradeCreated => "TRADE_CREATED",
            Self::TradeStatusUpdated => "TRADE_STATUS_UPDATED",
            Self::DocumentLinkedToTrade => "DOCUMENT_LINKED_TO_TRADE",
            Self::TradeDisputed => "TRADE_DISPUTED",
            Self::UserRegistered => "USER_REGISTERED",
            Self::UserApproved => "USER_APPROVED",
            Self::IntegrityCheckCompleted => "INTEGRITY_CHECK_COMPLETED",
            Self::TamperDetected => "TAMPER_DETECTED",
        }
    }

    /// Annotations record facts about a subject without moving its lifecycle.
    pub const fn is_annotation(&self) -> bool {
        matches!(
            self,
            Self::DocumentLinkedToTrade | Self::IntegrityCheckCompleted | Self::TamperDetected
        )
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Action {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|a| a.as_str() == s)
            .ok_or_else(|| LedgerError::UnknownAction {
                action: s.to_string(),
            })
    }
}

//! Subjects, actors, and roles.
//!
//! A subject is anything that owns exactly one chain: a trade-finance
//! document, a trade, or a user account. Actors are the principals whose
//! actions get recorded; the ledger trusts the identity provider for who they
//! are and only consults their role.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::error::LedgerError;

/// The kind of subject a chain belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubjectType {
    Document,
    Trade,
    User,
}

impl SubjectType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Document => "document",
            Self::Trade => "trade",
            Self::User => "user",
        }
    }
}

impl fmt::Display for SubjectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SubjectType {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "document" => Ok(Self::Document),
            "trade" => Ok(Self::Trade),
            "user" => Ok(Self::User),
            other => Err(LedgerError::InvalidSubject {
                input: other.to_string(),
            }),
        }
    }
}

/// Identifies one chain: `(subject_type, subject_id)`.
///
/// Textual form is `"<type>/<id>"`, e.g. `"document/BL-2024-0117"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SubjectRef {
    pub subject_type: SubjectType,
    pub subject_id: String,
}

impl SubjectRef {
    pub fn new(subject_type: SubjectType, subject_id: impl Into<String>) -> Self {
        Self {
            subject_type,
            subject_id: subject_id.into(),
        }
    }

    pub fn document(id: impl Into<String>) -> Self {
        Self::new(SubjectType::Document, id)
    }

    pub fn trade(id: impl Into<String>) -> Self {
        Self::new(SubjectType::Trade, id)
    }

    pub fn user(id: impl Into<String>) -> Self {
        Self::new(SubjectType::User, id)
    }
}

impl fmt::Display for SubjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.subject_type, self.subject_id)
    }
}

impl FromStr for SubjectRef {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || LedgerError::InvalidSubject {
            input: s.to_string(),
        };
        let (kind, id) = s.split_once('/').ok_or_else(invalid)?;
        if id.is_empty() {
            return Err(invalid());
        }
        let subject_type = kind.parse::<SubjectType>().map_err(|_| invalid())?;
        Ok(Self::new(subject_type, id))
    }
}

/// Stable identifier of the principal that triggered an action.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ActorId(pub String);

impl ActorId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl fmt::Display for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A role name as supplied by the identity provider.
///
/// Role names are matched verbatim against the `roles` lists in policy
/// rules, e.g. `"bank"`, `"auditor"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Role(pub String);

impl Role {
    pub const BANK: &'static str = "bank";
    pub const ADMIN: &'static str = "admin";
    pub const AUDITOR: &'static str = "auditor";
    pub const CORPORATE: &'static str = "corporate";
    /// Role of ledger-internal actors and of requests that carry no actor.
    pub const SYSTEM: &'static str = "system";

    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn system() -> Self {
        Self::new(Self::SYSTEM)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// An authenticated principal: identity plus the role it acts under.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub id: ActorId,
    pub role: Role,
}

impl Actor {
    pub fn new(id: impl Into<String>, role: impl Into<String>) -> Self {
        Self {
            id: ActorId::new(id),
            role: Role::new(role),
        }
    }

    /// A ledger-internal identity, e.g. the integrity verifier.
    pub fn system(id: impl Into<String>) -> Self {
        Self {
            id: ActorId::new(id),
            role: Role::system(),
        }
    }
}

//! Append requests.
//!
//! An `AppendRequest` is everything a caller supplies when recording an
//! action. The ledger fills in sequence, timestamp, and hashes; callers can
//! never construct a chain entry themselves.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{action::Action, subject::{Actor, SubjectRef}};

/// Open key/value payload carried by an entry.
///
/// A `BTreeMap` so top-level keys iterate in sorted order; the canonical
/// encoding sorts nested objects as well.
pub type Metadata = BTreeMap<String, Value>;

/// A request to extend a subject's chain by one entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppendRequest {
    /// The chain to extend.
    pub subject: SubjectRef,
    /// The action being recorded.
    pub action: Action,
    /// Who triggered it. `None` for system-generated entries.
    pub actor: Option<Actor>,
    /// Evidence and details for the action.
    pub metadata: Metadata,
    /// Collapses duplicate submissions of the same logical action.
    ///
    /// Two requests with the same subject, actor, action, and key inside the
    /// configured window produce a single entry.
    pub idempotency_key: Option<String>,
}

impl AppendRequest {
    pub fn new(subject: SubjectRef, action: Action) -> Self {
        Self {
            subject,
            action,
            actor: None,
            metadata: Metadata::new(),
            idempotency_key: None,
        }
    }

    pub fn actor(mut self, actor: Actor) -> Self {
        self.actor = Some(actor);
        self
    }

    pub fn meta(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    pub fn metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = metadata;
        self
    }

    pub fn idempotency_key(mut self, key: impl Into<String>) -> Self {
        self.idempotency_key = Some(key.into());
        self
    }
}

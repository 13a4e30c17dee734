//! Filters for global ledger queries.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use tradechain_contracts::{
    action::Action,
    subject::{ActorId, SubjectType},
};

use crate::entry::ChainEntry;

/// Criteria for `LedgerStore::get_all`. Unset fields match everything;
/// set fields are AND-combined. The time bounds are inclusive.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EntryFilter {
    pub subject_type: Option<SubjectType>,
    pub action: Option<Action>,
    pub actor_id: Option<ActorId>,
    pub since: Option<DateTime<Utc>>,
    pub until: Option<DateTime<Utc>>,
}

impl EntryFilter {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn subject_type(mut self, subject_type: SubjectType) -> Self {
        self.subject_type = Some(subject_type);
        self
    }

    pub fn action(mut self, action: Action) -> Self {
        self.action = Some(action);
        self
    }

    pub fn actor(mut self, actor_id: ActorId) -> Self {
        self.actor_id = Some(actor_id);
        self
    }

    pub fn between(mut self, since: DateTime<Utc>, until: DateTime<Utc>) -> Self {
        self.since = Some(since);
        self.until = Some(until);
        self
    }

    pub fn matches(&self, entry: &ChainEntry) -> bool {
        self.subject_type.map_or(true, |t| entry.subject_type() == t)
            && self.action.map_or(true, |a| entry.action() == a)
            && self
                .actor_id
                .as_ref()
                .map_or(true, |id| entry.actor_id() == Some(id))
            && self.since.map_or(true, |t| entry.created_at() >= t)
            && self.until.map_or(true, |t| entry.created_at() <= t)
    }
}

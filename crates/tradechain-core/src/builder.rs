//! The chain builder: the only path by which entries enter the ledger.
//!
//! The builder enforces the append protocol:
//!
//!   Idempotency → Metadata → Snapshot tip → Policy → Seal → CAS append → Hooks
//!
//! Concurrency control is optimistic. The builder reads the tip without a
//! lock, seals the new entry against it, and asks the store to append only
//! if that tip is still current. Two appends that observed the same tip
//! cannot both commit, so a chain can never fork. The loser gets
//! `ConcurrentModification` and the builder does not retry it: whether the
//! action still makes sense against the new tip is the caller's decision.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
    time::{Duration, Instant},
};

use chrono::Utc;
use tracing::{debug, info, warn};

use tradechain_contracts::{
    action::Action,
    error::{LedgerError, LedgerResult},
    hash::Sha256Hash,
    policy::{PolicyVerdict, TransitionContext},
    request::AppendRequest,
    subject::{ActorId, Role, SubjectRef},
};

use crate::{
    entry::{current_state, ChainEntry, Draft},
    hooks::HookDispatcher,
    traits::{LedgerStore, MetadataValidator, TransitionPolicy},
};

/// A sealed entry waiting to be committed against the tip it was built on.
#[derive(Debug, Clone)]
pub struct PreparedAppend {
    entry: ChainEntry,
    idempotency_key: Option<IdempotencyKey>,
}

impl PreparedAppend {
    /// The entry that `commit` will try to persist.
    pub fn entry(&self) -> &ChainEntry {
        &self.entry
    }

    /// The tip hash this entry was sealed against.
    pub fn expected_previous_hash(&self) -> &Sha256Hash {
        self.entry.previous_hash()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct IdempotencyKey {
    subject: SubjectRef,
    actor: Option<ActorId>,
    action: Action,
    key: String,
}

impl IdempotencyKey {
    fn from_request(request: &AppendRequest) -> Option<Self> {
        request.idempotency_key.as_ref().map(|key| Self {
            subject: request.subject.clone(),
            actor: request.actor.as_ref().map(|a| a.id.clone()),
            action: request.action,
            key: key.clone(),
        })
    }
}

/// Recently committed idempotency keys and the entries they produced.
struct IdempotencyCache {
    window: Duration,
    seen: Mutex<HashMap<IdempotencyKey, (Instant, ChainEntry)>>,
}

impl IdempotencyCache {
    fn new(window: Duration) -> Self {
        Self {
            window,
            seen: Mutex::new(HashMap::new()),
        }
    }

    fn lookup(&self, key: &IdempotencyKey) -> LedgerResult<Option<ChainEntry>> {
        if self.window.is_zero() {
            return Ok(None);
        }
        let seen = self.seen.lock().map_err(poisoned)?;
        Ok(seen
            .get(key)
            .filter(|(at, _)| at.elapsed() < self.window)
            .map(|(_, entry)| entry.clone()))
    }

    fn record(&self, key: IdempotencyKey, entry: ChainEntry) -> LedgerResult<()> {
        if self.window.is_zero() {
            return Ok(());
        }
        let mut seen = self.seen.lock().map_err(poisoned)?;
        let window = self.window;
        seen.retain(|_, (at, _)| at.elapsed() < window);
        seen.insert(key, (Instant::now(), entry));
        Ok(())
    }
}

fn poisoned<T>(e: std::sync::PoisonError<T>) -> LedgerError {
    LedgerError::Storage {
        reason: format!("builder state lock poisoned: {}", e),
    }
}

/// Validates, seals, and appends chain entries.
///
/// One builder serves every subject. It holds no per-subject state; all
/// chain state lives in the `LedgerStore`.
pub struct ChainBuilder {
    store: Arc<dyn LedgerStore>,
    policy: Arc<dyn TransitionPolicy>,
    validator: Option<Arc<dyn MetadataValidator>>,
    hooks: HookDispatcher,
    idempotency: IdempotencyCache,
}

impl ChainBuilder {
    /// Create a builder with no metadata validator, no hooks, and a
    /// five-minute idempotency window.
    pub fn new(store: Arc<dyn LedgerStore>, policy: Arc<dyn TransitionPolicy>) -> Self {
        Self {
            store,
            policy,
            validator: None,
            hooks: HookDispatcher::disabled(),
            idempotency: IdempotencyCache::new(Duration::from_secs(300)),
        }
    }

    pub fn with_validator(mut self, validator: Arc<dyn MetadataValidator>) -> Self {
        self.validator = Some(validator);
        self
    }

    pub fn with_hooks(mut self, hooks: HookDispatcher) -> Self {
        self.hooks = hooks;
        self
    }

    /// Set how long idempotency keys collapse duplicates. Zero disables it.
    pub fn with_idempotency_window(mut self, window: Duration) -> Self {
        self.idempotency = IdempotencyCache::new(window);
        self
    }

    pub fn store(&self) -> &Arc<dyn LedgerStore> {
        &self.store
    }

    pub fn policy(&self) -> &Arc<dyn TransitionPolicy> {
        &self.policy
    }

    /// The full chain of `subject`, in sequence order.
    pub fn get_chain(&self, subject: &SubjectRef) -> LedgerResult<Vec<ChainEntry>> {
        self.store.get_chain(subject)
    }

    /// Extend `request.subject`'s chain by exactly one entry.
    ///
    /// # Errors
    ///
    /// - `InvalidMetadata` — the payload fails the validator
    /// - `InvalidTransition` — the action is not valid in the current state
    /// - `Forbidden` — the actor's role may not perform the action
    /// - `ConcurrentModification` — another append won the race for the tip
    /// - `Storage` — the store failed; nothing was committed
    ///
    /// A repeated request with the same idempotency key inside the window
    /// returns the originally committed entry and appends nothing.
    pub fn append(&self, request: AppendRequest) -> LedgerResult<ChainEntry> {
        if let Some(key) = IdempotencyKey::from_request(&request) {
            if let Some(existing) = self.idempotency.lookup(&key)? {
                info!(
                    subject = %request.subject,
                    action = %request.action,
                    key = %key.key,
                    sequence = existing.sequence(),
                    "duplicate append collapsed by idempotency key"
                );
                return Ok(existing);
            }
        }

        let prepared = self.prepare(request)?;
        self.commit(prepared)
    }

    /// Validate `request` and seal an entry against the current tip.
    ///
    /// Nothing is persisted. The returned `PreparedAppend` commits only if
    /// the tip it observed is still the tip at `commit` time.
    pub fn prepare(&self, request: AppendRequest) -> LedgerResult<PreparedAppend> {
        let subject = &request.subject;

        // ── Metadata ─────────────────────────────────────────────────────────
        if let Some(validator) = &self.validator {
            validator.validate(request.action, &request.metadata)?;
        }

        // ── Snapshot ─────────────────────────────────────────────────────────
        let chain = self.store.get_chain(subject)?;
        let tip = chain.last();

        let role = request
            .actor
            .as_ref()
            .map(|a| a.role.clone())
            .unwrap_or_else(Role::system);

        let ctx = TransitionContext {
            subject_type: subject.subject_type,
            subject_id: subject.subject_id.clone(),
            action: request.action,
            actor_id: request.actor.as_ref().map(|a| a.id.0.clone()),
            role: role.0.clone(),
            current_state: current_state(&chain),
            previous_action: tip.map(ChainEntry::action),
            chain_length: chain.len() as u64,
        };

        debug!(
            subject = %subject,
            action = %request.action,
            role = %role,
            state = %ctx.current_state,
            chain_length = ctx.chain_length,
            "evaluating transition"
        );

        // ── Policy ───────────────────────────────────────────────────────────
        match self.policy.evaluate(&ctx)? {
            PolicyVerdict::Allow => {}
            PolicyVerdict::Deny { reason } => {
                warn!(
                    subject = %subject,
                    action = %request.action,
                    state = %ctx.current_state,
                    reason = %reason,
                    "transition denied"
                );
                return Err(LedgerError::InvalidTransition {
                    subject: subject.to_string(),
                    action: request.action.to_string(),
                    reason,
                });
            }
            PolicyVerdict::Forbidden { reason } => {
                warn!(
                    subject = %subject,
                    action = %request.action,
                    role = %role,
                    reason = %reason,
                    "role not permitted"
                );
                return Err(LedgerError::Forbidden {
                    role: role.0,
                    action: request.action.to_string(),
                });
            }
        }

        // ── Seal ─────────────────────────────────────────────────────────────
        let now = Utc::now();
        let (sequence, previous_hash, created_at) = match tip {
            // Clamp so timestamps never run backwards within a chain, even
            // if the wall clock does.
            Some(tip) => (tip.sequence() + 1, *tip.entry_hash(), now.max(tip.created_at())),
            None => (0, Sha256Hash::GENESIS, now),
        };

        let idempotency_key = IdempotencyKey::from_request(&request);
        let entry = ChainEntry::seal(Draft {
            subject: request.subject,
            sequence,
            action: request.action,
            actor_id: request.actor.map(|a| a.id),
            metadata: request.metadata,
            created_at,
            previous_hash,
        })?;

        Ok(PreparedAppend {
            entry,
            idempotency_key,
        })
    }

    /// Persist a prepared entry if its observed tip is still current.
    pub fn commit(&self, prepared: PreparedAppend) -> LedgerResult<ChainEntry> {
        let PreparedAppend {
            entry,
            idempotency_key,
        } = prepared;
        let subject = entry.subject();

        if let Err(e) =
            self.store
                .append_if_tip_matches(&subject, entry.previous_hash(), entry.clone())
        {
            if matches!(e, LedgerError::ConcurrentModification { .. }) {
                warn!(
                    subject = %subject,
                    action = %entry.action(),
                    sequence = entry.sequence(),
                    "append lost the race for the chain tip"
                );
            }
            return Err(e);
        }

        info!(
            subject = %subject,
            action = %entry.action(),
            sequence = entry.sequence(),
            entry_hash = %entry.entry_hash(),
            "entry appended"
        );

        if let Some(key) = idempotency_key {
            // The entry is durable; a cache failure must not turn it into an error.
            if let Err(e) = self.idempotency.record(key, entry.clone()) {
                warn!(subject = %subject, error = %e, "could not record idempotency key");
            }
        }

        self.hooks.dispatch(entry.clone());
        Ok(entry)
    }

    /// Drain pending hook notifications and stop the hook worker.
    pub fn shutdown(&self) {
        self.hooks.shutdown();
    }
}

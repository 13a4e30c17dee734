//! Post-commit event hooks.
//!
//! `HookDispatcher` owns a background worker thread. The chain builder hands
//! it every committed entry through a channel and returns to its caller
//! immediately; the worker runs each registered hook with bounded retries.
//! A hook that still fails is logged and dropped. The append it reacts to
//! is already durable and is never rolled back.

use std::{
    collections::HashSet,
    sync::{
        mpsc::{self, Sender},
        Arc, Mutex,
    },
    thread::{self, JoinHandle},
    time::Duration,
};

use tracing::{debug, error, warn};

use tradechain_contracts::{
    action::Action,
    error::{LedgerError, LedgerResult},
    risk::RiskRecalculationRequest,
};

use crate::{
    config::HookSettings,
    entry::ChainEntry,
    traits::{EventHook, RiskRecalculator},
};

/// Asynchronous fan-out of committed entries to event hooks.
pub struct HookDispatcher {
    sender: Mutex<Option<Sender<ChainEntry>>>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl HookDispatcher {
    /// Start a worker thread that runs `hooks` for every dispatched entry.
    ///
    /// With no hooks, no thread is started and `dispatch` is a no-op.
    pub fn spawn(hooks: Vec<Arc<dyn EventHook>>, settings: &HookSettings) -> LedgerResult<Self> {
        if hooks.is_empty() {
            return Ok(Self::disabled());
        }

        let (tx, rx) = mpsc::channel::<ChainEntry>();
        let max_attempts = settings.max_attempts.max(1);
        let backoff = Duration::from_millis(settings.retry_backoff_ms);

        let worker = thread::Builder::new()
            .name("tradechain-hooks".to_string())
            .spawn(move || {
                // Ends once every sender is dropped and the queue is drained.
                for entry in rx {
                    for hook in &hooks {
                        run_with_retry(hook.as_ref(), &entry, max_attempts, backoff);
                    }
                }
                debug!("hook dispatcher drained, worker exiting");
            })
            .map_err(|e| LedgerError::ConfigError {
                reason: format!("failed to start hook worker thread: {}", e),
            })?;

        Ok(Self {
            sender: Mutex::new(Some(tx)),
            worker: Mutex::new(Some(worker)),
        })
    }

    /// A dispatcher that drops every entry.
    pub fn disabled() -> Self {
        Self {
            sender: Mutex::new(None),
            worker: Mutex::new(None),
        }
    }

    /// Queue `entry` for the hooks. Never blocks on hook execution.
    pub fn dispatch(&self, entry: ChainEntry) {
        let Ok(guard) = self.sender.lock() else {
            warn!("hook dispatcher lock poisoned; notification dropped");
            return;
        };
        if let Some(tx) = guard.as_ref() {
            let subject = entry.subject();
            let sequence = entry.sequence();
            if tx.send(entry).is_err() {
                warn!(%subject, sequence, "hook worker has stopped; notification dropped");
            }
        }
    }

    /// Stop accepting entries, let the worker finish the queue, and join it.
    ///
    /// Idempotent. Entries dispatched afterwards are dropped.
    pub fn shutdown(&self) {
        if let Ok(mut guard) = self.sender.lock() {
            guard.take();
        }
        let handle = match self.worker.lock() {
            Ok(mut guard) => guard.take(),
            Err(_) => None,
        };
        if let Some(handle) = handle {
            if handle.join().is_err() {
                error!("hook worker thread panicked");
            }
        }
    }
}

impl Drop for HookDispatcher {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn run_with_retry(hook: &dyn EventHook, entry: &ChainEntry, max_attempts: u32, backoff: Duration) {
    for attempt in 1..=max_attempts {
        match hook.on_append(entry) {
            Ok(()) => {
                debug!(
                    hook = hook.name(),
                    subject = %entry.subject(),
                    sequence = entry.sequence(),
                    attempt,
                    "hook completed"
                );
                return;
            }
            Err(e) if attempt < max_attempts => {
                warn!(
                    hook = hook.name(),
                    subject = %entry.subject(),
                    sequence = entry.sequence(),
                    attempt,
                    error = %e,
                    "hook failed, retrying"
                );
                thread::sleep(backoff * attempt);
            }
            Err(e) => {
                error!(
                    hook = hook.name(),
                    subject = %entry.subject(),
                    sequence = entry.sequence(),
                    attempts = max_attempts,
                    error = %e,
                    "hook failed permanently; entry remains committed"
                );
            }
        }
    }
}

/// Triggers risk recalculation for qualifying actions.
///
/// The counterparty to rescore is `metadata.owner_id` when present,
/// otherwise the entry's actor. Entries with neither are skipped.
pub struct RiskRecalculationHook {
    service: Arc<dyn RiskRecalculator>,
    triggers: HashSet<Action>,
}

impl RiskRecalculationHook {
    pub fn new(service: Arc<dyn RiskRecalculator>, triggers: impl IntoIterator<Item = Action>) -> Self {
        Self {
            service,
            triggers: triggers.into_iter().collect(),
        }
    }

    /// Build the request for `entry`, or `None` if it does not qualify.
    pub fn request_for(&self, entry: &ChainEntry) -> Option<RiskRecalculationRequest> {
        if !self.triggers.contains(&entry.action()) {
            return None;
        }
        let owner = entry
            .metadata()
            .get("owner_id")
            .and_then(|v| v.as_str())
            .map(str::to_string)
            .or_else(|| entry.actor_id().map(|a| a.0.clone()))?;

        Some(RiskRecalculationRequest {
            subject_owner_id: owner,
            trigger_reason: format!("{} on {}", entry.action(), entry.subject()),
            subject: entry.subject(),
            sequence: entry.sequence(),
        })
    }
}

impl EventHook for RiskRecalculationHook {
    fn name(&self) -> &str {
        "risk-recalculation"
    }

    fn on_append(&self, entry: &ChainEntry) -> LedgerResult<()> {
        match self.request_for(entry) {
            Some(request) => {
                debug!(
                    owner = %request.subject_owner_id,
                    reason = %request.trigger_reason,
                    "requesting risk recalculation"
                );
                self.service.recalculate(&request)
            }
            None => Ok(()),
        }
    }
}

//! In-memory implementation of `LedgerStore`.
//!
//! `InMemoryLedgerStore` keeps one `Vec` per subject, each behind its own
//! `Mutex`, so appends to different subjects never contend. The subject map
//! itself is behind an `RwLock` that is only write-locked the first time a
//! subject appears. A separate commit log records every entry in global
//! commit order for `get_all`.
//!
//! Lock order is always subject chain, then commit log.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex, PoisonError, RwLock},
};

use tracing::debug;

use tradechain_contracts::{
    error::{LedgerError, LedgerResult},
    hash::Sha256Hash,
    subject::SubjectRef,
};
use tradechain_core::{traits::LedgerStore, ChainEntry, EntryFilter};

use crate::tip::check_extends;

type SubjectChain = Arc<Mutex<Vec<ChainEntry>>>;

fn poisoned<T>(e: PoisonError<T>) -> LedgerError {
    LedgerError::Storage {
        reason: format!("ledger state lock poisoned: {}", e),
    }
}

/// An in-memory, append-only ledger.
///
/// # Thread safety
///
/// All methods take `&self`; share the store across threads with `Arc`.
#[derive(Default)]
pub struct InMemoryLedgerStore {
    chains: RwLock<HashMap<SubjectRef, SubjectChain>>,
    log: Mutex<Vec<ChainEntry>>,
}

impl InMemoryLedgerStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of entries across all subjects.
    pub fn len(&self) -> LedgerResult<usize> {
        Ok(self.log.lock().map_err(poisoned)?.len())
    }

    pub fn is_empty(&self) -> LedgerResult<bool> {
        Ok(self.len()? == 0)
    }

    fn chain(&self, subject: &SubjectRef) -> LedgerResult<Option<SubjectChain>> {
        Ok(self.chains.read().map_err(poisoned)?.get(subject).cloned())
    }

    fn chain_or_create(&self, subject: &SubjectRef) -> LedgerResult<SubjectChain> {
        if let Some(chain) = self.chain(subject)? {
            return Ok(chain);
        }
        let mut chains = self.chains.write().map_err(poisoned)?;
        Ok(chains.entry(subject.clone()).or_default().clone())
    }
}

impl LedgerStore for InMemoryLedgerStore {
    fn get_tip(&self, subject: &SubjectRef) -> LedgerResult<Option<ChainEntry>> {
        match self.chain(subject)? {
            Some(chain) => Ok(chain.lock().map_err(poisoned)?.last().cloned()),
            None => Ok(None),
        }
    }

    fn get_chain(&self, subject: &SubjectRef) -> LedgerResult<Vec<ChainEntry>> {
        match self.chain(subject)? {
            Some(chain) => Ok(chain.lock().map_err(poisoned)?.clone()),
            None => Ok(Vec::new()),
        }
    }

    fn append_if_tip_matches(
        &self,
        subject: &SubjectRef,
        expected_previous_hash: &Sha256Hash,
        entry: ChainEntry,
    ) -> LedgerResult<()> {
        let chain = self.chain_or_create(subject)?;
        let mut chain = chain.lock().map_err(poisoned)?;

        check_extends(subject, expected_previous_hash, chain.last(), &entry)?;

        debug!(
            subject = %subject,
            sequence = entry.sequence(),
            entry_hash = %entry.entry_hash(),
            "storing entry"
        );

        self.log.lock().map_err(poisoned)?.push(entry.clone());
        chain.push(entry);
        Ok(())
    }

    fn get_all(&self, filter: &EntryFilter) -> LedgerResult<Vec<ChainEntry>> {
        let log = self.log.lock().map_err(poisoned)?;
        Ok(log.iter().filter(|e| filter.matches(e)).cloned().collect())
    }

    fn subjects(&self) -> LedgerResult<Vec<SubjectRef>> {
        let chains = self.chains.read().map_err(poisoned)?;
        let mut subjects = Vec::with_capacity(chains.len());
        for (subject, chain) in chains.iter() {
            // A rejected first append leaves an empty chain behind.
            if !chain.lock().map_err(poisoned)?.is_empty() {
                subjects.push(subject.clone());
            }
        }
        subjects.sort();
        Ok(subjects)
    }
}

//! Durable JSON-lines implementation of `LedgerStore`.
//!
//! Every entry is one JSON object on its own line in a single file opened
//! in append mode. An append is durable before it becomes visible: the line
//! is written, flushed and `sync_data`'d, and only then added to the
//! in-memory index that serves reads.
//!
//! On open, every complete line is loaded as-is. Hashes are not recomputed
//! here; a file edited on disk loads fine and is caught by the verifier. A
//! trailing line without its newline is a torn write that never committed:
//! it is dropped from the file with a warning. Any other unreadable line is
//! a `Storage` error. `open_read_only` loads the same way but leaves the
//! file untouched and refuses appends.

use std::{
    collections::HashMap,
    fs::{File, OpenOptions},
    io::{Read, Write},
    path::{Path, PathBuf},
    sync::{Mutex, PoisonError},
};

use tracing::{debug, info, warn};

use tradechain_contracts::{
    error::{LedgerError, LedgerResult},
    hash::Sha256Hash,
    subject::SubjectRef,
};
use tradechain_core::{traits::LedgerStore, ChainEntry, EntryFilter};

use crate::tip::check_extends;

fn storage(context: &str, path: &Path, e: impl std::fmt::Display) -> LedgerError {
    LedgerError::Storage {
        reason: format!("{} '{}': {}", context, path.display(), e),
    }
}

fn poisoned<T>(e: PoisonError<T>) -> LedgerError {
    LedgerError::Storage {
        reason: format!("ledger file lock poisoned: {}", e),
    }
}

struct JsonlState {
    file: File,
    /// Byte length of the committed prefix of the file.
    committed_len: u64,
    chains: HashMap<SubjectRef, Vec<ChainEntry>>,
    log: Vec<ChainEntry>,
}

impl JsonlState {
    fn index(&mut self, entry: ChainEntry) {
        self.chains
            .entry(entry.subject())
            .or_default()
            .push(entry.clone());
        self.log.push(entry);
    }
}

/// An append-only ledger persisted as JSON lines.
///
/// Appends to all subjects serialize on the single file handle.
pub struct JsonlLedgerStore {
    path: PathBuf,
    read_only: bool,
    state: Mutex<JsonlState>,
}

impl JsonlLedgerStore {
    /// Open the ledger at `path`, creating an empty file if none exists.
    ///
    /// A torn trailing line is truncated away so the next append starts on a
    /// clean line.
    pub fn open(path: impl AsRef<Path>) -> LedgerResult<Self> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .append(true)
            .open(&path)
            .map_err(|e| storage("failed to open ledger file", &path, e))?;
        Self::load(path, file, false)
    }

    /// Open an existing ledger for inspection only.
    ///
    /// The file is never created, truncated or written: a torn trailing line
    /// is skipped in memory and every append is refused with `Storage`.
    pub fn open_read_only(path: impl AsRef<Path>) -> LedgerResult<Self> {
        let path = path.as_ref().to_path_buf();
        let file = File::open(&path).map_err(|e| storage("failed to open ledger file", &path, e))?;
        Self::load(path, file, true)
    }

    fn load(path: PathBuf, mut file: File, read_only: bool) -> LedgerResult<Self> {
        let mut contents = String::new();
        file.read_to_string(&mut contents)
            .map_err(|e| storage("failed to read ledger file", &path, e))?;

        let mut state = JsonlState {
            file,
            committed_len: 0,
            chains: HashMap::new(),
            log: Vec::new(),
        };

        let mut committed_len = 0usize;
        for (index, line) in contents.split_inclusive('\n').enumerate() {
            let Some(json) = line.strip_suffix('\n') else {
                warn!(
                    path = %path.display(),
                    line = index + 1,
                    bytes = line.len(),
                    read_only,
                    "discarding torn trailing line"
                );
                break;
            };
            committed_len += line.len();
            if json.trim().is_empty() {
                continue;
            }
            let entry: ChainEntry = serde_json::from_str(json).map_err(|e| LedgerError::Storage {
                reason: format!("malformed entry at {}:{}: {}", path.display(), index + 1, e),
            })?;
            state.index(entry);
        }

        if committed_len < contents.len() && !read_only {
            state
                .file
                .set_len(committed_len as u64)
                .map_err(|e| storage("failed to truncate torn write in", &path, e))?;
        }
        state.committed_len = committed_len as u64;

        info!(
            path = %path.display(),
            entries = state.log.len(),
            subjects = state.chains.len(),
            read_only,
            "ledger file opened"
        );

        Ok(Self {
            path,
            read_only,
            state: Mutex::new(state),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_read_only(&self) -> bool {
        self.read_only
    }
}

impl LedgerStore for JsonlLedgerStore {
    fn get_tip(&self, subject: &SubjectRef) -> LedgerResult<Option<ChainEntry>> {
        let state = self.state.lock().map_err(poisoned)?;
        Ok(state.chains.get(subject).and_then(|c| c.last().cloned()))
    }

    fn get_chain(&self, subject: &SubjectRef) -> LedgerResult<Vec<ChainEntry>> {
        let state = self.state.lock().map_err(poisoned)?;
        Ok(state.chains.get(subject).cloned().unwrap_or_default())
    }

    fn append_if_tip_matches(
        &self,
        subject: &SubjectRef,
        expected_previous_hash: &Sha256Hash,
        entry: ChainEntry,
    ) -> LedgerResult<()> {
        if self.read_only {
            return Err(storage("cannot append, opened read-only", &self.path, subject));
        }
        let mut state = self.state.lock().map_err(poisoned)?;

        let tip = state.chains.get(subject).and_then(|c| c.last());
        check_extends(subject, expected_previous_hash, tip, &entry)?;

        let mut line = serde_json::to_string(&entry).map_err(|e| LedgerError::Encoding {
            reason: format!("failed to serialize entry: {}", e),
        })?;
        line.push('\n');

        let written = state
            .file
            .write_all(line.as_bytes())
            .and_then(|_| state.file.flush())
            .and_then(|_| state.file.sync_data());
        if let Err(e) = written {
            // Drop any partial line so the next append starts on a clean boundary.
            let committed_len = state.committed_len;
            if let Err(trunc) = state.file.set_len(committed_len) {
                warn!(path = %self.path.display(), error = %trunc, "could not roll back partial append");
            }
            return Err(storage("failed to append to ledger file", &self.path, e));
        }
        state.committed_len += line.len() as u64;

        debug!(
            subject = %subject,
            sequence = entry.sequence(),
            entry_hash = %entry.entry_hash(),
            "entry persisted"
        );

        state.index(entry);
        Ok(())
    }

    fn get_all(&self, filter: &EntryFilter) -> LedgerResult<Vec<ChainEntry>> {
        let state = self.state.lock().map_err(poisoned)?;
        Ok(state.log.iter().filter(|e| filter.matches(e)).cloned().collect())
    }

    fn subjects(&self) -> LedgerResult<Vec<SubjectRef>> {
        let state = self.state.lock().map_err(poisoned)?;
        let mut subjects: Vec<SubjectRef> = state.chains.keys().cloned().collect();
        subjects.sort();
        Ok(subjects)
    }
}

//! Revert engine: caches processed changes and undoes them on disk.
//!
//! Locks are taken per change id, then per target path. The ledger entry is
//! committed before a revert returns; if that commit fails, the target is put
//! back to the exact bytes it held before the revert.

use agrewind_engine::{DiffContext, RevertStatus, process_changes};
use agrewind_index::RevertLedger;
use agrewind_types::{
    AttributedChange, ParsedChange, RevertAction, RevertOutcome, RevertRecord, SessionFile,
};
use chrono::Utc;
use std::collections::{HashMap, HashSet};
use std::io::{ErrorKind, Write};
use std::path::Path;
use std::sync::{Mutex, RwLock};
use tempfile::NamedTempFile;

use crate::locks::{KeyedLocks, acquire};
use crate::{Error, Result, RevertRejected};

#[derive(Debug, Clone)]
struct CachedChange {
    session_id: String,
    change: ParsedChange,
}

pub struct RevertEngine {
    ledger: Mutex<RevertLedger>,
    reverted: RwLock<HashSet<String>>,
    changes: Mutex<HashMap<String, CachedChange>>,
    change_locks: KeyedLocks,
    path_locks: KeyedLocks,
}

impl RevertEngine {
    /// Build an engine over `ledger`, loading every reverted id once.
    pub fn init(ledger: RevertLedger) -> Result<Self> {
        let reverted: HashSet<String> = ledger
            .load()?
            .into_iter()
            .map(|record| record.change_id)
            .collect();

        tracing::debug!(reverted = reverted.len(), "revert ledger loaded");

        Ok(Self {
            ledger: Mutex::new(ledger),
            reverted: RwLock::new(reverted),
            changes: Mutex::new(HashMap::new()),
            change_locks: KeyedLocks::new(),
            path_locks: KeyedLocks::new(),
        })
    }

    pub fn open(ledger_path: &Path) -> Result<Self> {
        Self::init(RevertLedger::open(ledger_path)?)
    }

    pub fn is_reverted(&self, change_id: &str) -> bool {
        self.reverted
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .contains(change_id)
    }

    /// Simulate a session's changes and remember them for later reverts.
    ///
    /// Snapshots are captured the first time a change is seen and reused
    /// afterwards, so reverting one change does not shift the "before" of
    /// the others. Revert status and session recency are always current.
    /// The cache holds one entry per change id of every session processed
    /// during the engine's lifetime.
    pub fn process_session_changes<I>(&self, session: &SessionFile, changes: I) -> Vec<ParsedChange>
    where
        I: IntoIterator<Item = AttributedChange>,
    {
        let ctx = DiffContext {
            is_latest_session: session.is_latest,
            reverted: self,
        };
        let fresh = process_changes(changes, &ctx);

        let mut cache = acquire(&self.changes);
        fresh
            .into_iter()
            .map(|change| {
                let cached = cache
                    .entry(change.id().to_string())
                    .or_insert_with(|| CachedChange {
                        session_id: session.id.clone(),
                        change,
                    });
                cached.change.is_latest_session = session.is_latest;
                cached.change.can_revert = session.is_latest
                    && cached.change.error.is_none()
                    && !self.is_reverted(cached.change.id());
                cached.change.clone()
            })
            .collect()
    }

    /// Cached change and the id of the session it came from.
    pub fn cached_change(&self, change_id: &str) -> Option<(String, ParsedChange)> {
        acquire(&self.changes)
            .get(change_id)
            .map(|cached| (cached.session_id.clone(), cached.change.clone()))
    }

    pub fn reverted_changes(&self) -> Result<Vec<RevertRecord>> {
        Ok(acquire(&self.ledger).load()?)
    }

    /// Undo `change` on disk and record it in the ledger.
    pub fn revert(&self, change: &ParsedChange) -> Result<RevertOutcome> {
        self.change_locks
            .with_lock(change.id(), || self.revert_locked(change))
    }

    fn revert_locked(&self, change: &ParsedChange) -> Result<RevertOutcome> {
        let change_id = change.id();

        if self.is_reverted(change_id) {
            return Err(RevertRejected::AlreadyReverted(change_id.to_string()).into());
        }
        if !change.is_latest_session {
            return Err(RevertRejected::NotLatestSession(change_id.to_string()).into());
        }
        if let Some(reason) = &change.error {
            return Err(RevertRejected::Unrevertable {
                change_id: change_id.to_string(),
                reason: reason.clone(),
            }
            .into());
        }

        self.path_locks
            .with_lock(&change.change.file_path, || self.apply_revert(change))
    }

    fn apply_revert(&self, change: &ParsedChange) -> Result<RevertOutcome> {
        let change_id = change.id();
        let prior = capture(change.path())?;
        let action = restore(change)?;
        let record = RevertRecord {
            change_id: change_id.to_string(),
            reverted_at: Utc::now(),
        };

        if let Err(err) = acquire(&self.ledger).record_revert(&record) {
            tracing::warn!(change_id, error = %err, "ledger commit failed, rolling back file");
            if let Err(rollback) = put_back(change.path(), prior) {
                tracing::error!(change_id, error = %rollback, "rollback failed");
            }
            return Err(err.into());
        }

        self.reverted
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(change_id.to_string());

        tracing::info!(change_id, file = %change.change.file_path, ?action, "change reverted");

        Ok(RevertOutcome {
            change_id: record.change_id,
            file_path: change.change.file_path.clone(),
            action,
            reverted_at: record.reverted_at,
        })
    }
}

impl RevertStatus for RevertEngine {
    fn is_reverted(&self, change_id: &str) -> bool {
        RevertEngine::is_reverted(self, change_id)
    }
}

fn restore(change: &ParsedChange) -> Result<RevertAction> {
    let path = change.path();

    if change.is_creation {
        return match std::fs::remove_file(path) {
            Ok(()) => Ok(RevertAction::Deleted),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(RevertAction::AlreadyAbsent),
            Err(err) => Err(Error::io(path, err)),
        };
    }

    write_atomic(path, change.before.as_bytes())?;
    Ok(RevertAction::Restored)
}

/// Bytes on disk at `path`, `None` if the file does not exist.
fn capture(path: &Path) -> Result<Option<Vec<u8>>> {
    match std::fs::read(path) {
        Ok(bytes) => Ok(Some(bytes)),
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
        Err(err) => Err(Error::io(path, err)),
    }
}

/// Return `path` to the state [`capture`] saw before the revert.
fn put_back(path: &Path, prior: Option<Vec<u8>>) -> Result<()> {
    match prior {
        Some(bytes) => write_atomic(path, &bytes),
        None => match std::fs::remove_file(path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(err) => Err(Error::io(path, err)),
        },
    }
}

/// Replace `path` with `content` through a synced sibling temporary file.
pub fn write_atomic(path: &Path, content: &[u8]) -> Result<()> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;

    let permissions = std::fs::metadata(path).ok().map(|m| m.permissions());

    let mut tmp = NamedTempFile::new_in(parent).map_err(|e| Error::io(parent, e))?;
    tmp.write_all(content).map_err(|e| Error::io(tmp.path(), e))?;
    if let Some(permissions) = permissions {
        tmp.as_file()
            .set_permissions(permissions)
            .map_err(|e| Error::io(tmp.path(), e))?;
    }
    tmp.as_file().sync_all().map_err(|e| Error::io(tmp.path(), e))?;
    tmp.persist(path).map_err(|e| Error::io(path, e.error))?;

    Ok(())
}

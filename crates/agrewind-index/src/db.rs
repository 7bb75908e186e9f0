use agrewind_types::RevertRecord;
use rusqlite::Connection;
use std::path::Path;

use crate::{Result, queries, schema};

/// Durable set of reverted change ids.
///
/// Every write is committed with `synchronous = FULL`, so a record returned as
/// written survives a crash or restart.
pub struct RevertLedger {
    conn: Connection,
}

impl RevertLedger {
    /// Open (or create) the ledger at `db_path`, creating parent directories.
    pub fn open(db_path: &Path) -> Result<Self> {
        if let Some(parent) = db_path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(db_path)?;
        conn.pragma_update(None, "synchronous", "FULL")?;
        schema::init_schema(&conn)?;
        Ok(Self { conn })
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        schema::init_schema(&conn)?;
        Ok(Self { conn })
    }

    /// Every persisted record, newest first.
    pub fn load(&self) -> Result<Vec<RevertRecord>> {
        queries::revert::list(&self.conn)
    }

    /// Persist `record`; an existing entry for the same change is updated.
    pub fn record_revert(&self, record: &RevertRecord) -> Result<()> {
        queries::revert::insert_or_update(&self.conn, record)
    }

    pub fn get(&self, change_id: &str) -> Result<Option<RevertRecord>> {
        queries::revert::get(&self.conn, change_id)
    }

    pub fn is_reverted(&self, change_id: &str) -> Result<bool> {
        Ok(self.get(change_id)?.is_some())
    }

    pub fn count(&self) -> Result<usize> {
        let count: i64 =
            self.conn
                .query_row("SELECT COUNT(*) FROM reverted_changes", [], |row| row.get(0))?;
        Ok(count as usize)
    }
}

use rusqlite::Connection;

use crate::{Error, Result};

// Schema version (increment when changing table definitions)
pub const SCHEMA_VERSION: i32 = 1;

// The ledger is the only record of what has been reverted, so tables are
// migrated forward and never dropped.
pub fn init_schema(conn: &Connection) -> Result<()> {
    let current_version: i32 = conn.query_row("PRAGMA user_version", [], |row| row.get(0))?;

    if current_version > SCHEMA_VERSION {
        return Err(Error::Query(format!(
            "ledger schema version {} is newer than supported version {}",
            current_version, SCHEMA_VERSION
        )));
    }

    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS reverted_changes (
            change_id TEXT PRIMARY KEY,
            reverted_at TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_reverted_at ON reverted_changes(reverted_at DESC);
        "#,
    )?;

    if current_version != SCHEMA_VERSION {
        conn.execute(&format!("PRAGMA user_version = {}", SCHEMA_VERSION), [])?;
    }

    Ok(())
}

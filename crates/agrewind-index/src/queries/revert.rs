use agrewind_types::RevertRecord;
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{Connection, OptionalExtension, params};

use crate::{Error, Result};

fn format_ts(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_ts(change_id: &str, raw: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|e| {
            Error::Query(format!(
                "invalid reverted_at '{}' for change {}: {}",
                raw, change_id, e
            ))
        })
}

pub fn insert_or_update(conn: &Connection, record: &RevertRecord) -> Result<()> {
    conn.execute(
        r#"
        INSERT INTO reverted_changes (change_id, reverted_at)
        VALUES (?1, ?2)
        ON CONFLICT(change_id) DO UPDATE SET
            reverted_at = ?2
        "#,
        params![&record.change_id, format_ts(&record.reverted_at)],
    )?;

    Ok(())
}

pub fn get(conn: &Connection, change_id: &str) -> Result<Option<RevertRecord>> {
    let raw: Option<String> = conn
        .query_row(
            r#"
        SELECT reverted_at
        FROM reverted_changes
        WHERE change_id = ?1
        "#,
            [change_id],
            |row| row.get(0),
        )
        .optional()?;

    raw.map(|raw| {
        Ok(RevertRecord {
            change_id: change_id.to_string(),
            reverted_at: parse_ts(change_id, &raw)?,
        })
    })
    .transpose()
}

pub fn list(conn: &Connection) -> Result<Vec<RevertRecord>> {
    let mut stmt = conn.prepare(
        r#"
        SELECT change_id, reverted_at
        FROM reverted_changes
        ORDER BY reverted_at DESC, change_id ASC
        "#,
    )?;

    let rows = stmt
        .query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    rows.into_iter()
        .map(|(change_id, raw)| {
            let reverted_at = parse_ts(&change_id, &raw)?;
            Ok(RevertRecord {
                change_id,
                reverted_at,
            })
        })
        .collect()
}

//! Versioned schema for the SQLite blob store.
//!
//! `MIGRATIONS[n]` upgrades a database from version `n` to `n + 1`. Applied
//! versions are recorded in `schema_migrations`; a database written by a newer
//! build is refused rather than guessed at.

use rusqlite::{params, Connection, OptionalExtension};

use crate::error::{Result, StoreError};

/// Upgrade scripts, oldest first.
const MIGRATIONS: &[&str] = &[
    // v1: content-addressed blobs
    r#"
    CREATE TABLE blobs (
        address BLOB PRIMARY KEY,         -- 32 bytes, Blake3 of bytes
        bytes BLOB NOT NULL,
        size INTEGER NOT NULL,
        stored_at INTEGER NOT NULL        -- local Unix ms
    );
    CREATE INDEX idx_blobs_stored_at ON blobs(stored_at);
    "#,
];

/// Schema version this build writes.
pub const CURRENT_VERSION: u32 = MIGRATIONS.len() as u32;

/// Bring the schema up to [`CURRENT_VERSION`]. Safe to call on every open.
pub fn migrate(conn: &mut Connection) -> Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version INTEGER PRIMARY KEY,
            applied_at INTEGER NOT NULL
        )",
    )?;

    let applied = schema_version(conn)?;
    if applied > CURRENT_VERSION {
        return Err(StoreError::Migration(format!(
            "database schema version {applied} is newer than supported version {CURRENT_VERSION}"
        )));
    }

    let pending = &MIGRATIONS[applied as usize..];
    if pending.is_empty() {
        return Ok(());
    }

    let tx = conn.transaction()?;
    for (offset, script) in pending.iter().enumerate() {
        let version = applied + offset as u32 + 1;
        tx.execute_batch(script)?;
        tx.execute(
            "INSERT INTO schema_migrations (version, applied_at) VALUES (?1, ?2)",
            params![version, now_millis()],
        )?;
        tracing::debug!(version, "applied schema migration");
    }
    tx.commit()?;
    Ok(())
}

/// Highest applied version, 0 for a fresh database.
pub fn schema_version(conn: &Connection) -> Result<u32> {
    let version: Option<u32> = conn
        .query_row("SELECT MAX(version) FROM schema_migrations", [], |row| row.get(0))
        .optional()?
        .flatten();
    Ok(version.unwrap_or(0))
}

pub(crate) fn now_millis() -> i64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}

//! Boolean application flags stored next to task data.
//!
//! # Responsibility
//! - Read and write named process-wide boolean flags in `app_flags`.
//!
//! # Invariants
//! - A missing row reads as `false`.
//! - Writes are upserts; setting the same value twice is a no-op.

use crate::repo::task_repo::RepoResult;
use rusqlite::{params, Connection, OptionalExtension};

/// Flag recording that the one-time seed import has committed.
pub const SEED_IMPORTED_FLAG: &str = "seed_imported";

/// Reads a named flag; missing rows read as `false`.
pub fn read_flag(conn: &Connection, key: &str) -> RepoResult<bool> {
    let value = conn
        .query_row(
            "SELECT value FROM app_flags WHERE key = ?1;",
            [key],
            |row| row.get::<_, i64>(0),
        )
        .optional()?;
    Ok(value == Some(1))
}

/// Upserts a named flag.
pub fn write_flag(conn: &Connection, key: &str, value: bool) -> RepoResult<()> {
    conn.execute(
        "INSERT INTO app_flags (key, value)
         VALUES (?1, ?2)
         ON CONFLICT(key) DO UPDATE SET
            value = excluded.value,
            updated_at = (strftime('%s', 'now') * 1000);",
        params![key, i64::from(value)],
    )?;
    Ok(())
}

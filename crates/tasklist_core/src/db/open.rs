//! Connection setup for the task database.
//!
//! # Invariants
//! - Returned connections enforce foreign keys and wait up to
//!   `BUSY_TIMEOUT` on a locked database.
//! - File connections use WAL so the store's reader never waits on its writer.
//! - Returned connections are migrated to `latest_version()`.

use super::migrations::apply_migrations;
use super::DbResult;
use log::{error, info};
use rusqlite::Connection;
use std::path::Path;
use std::time::{Duration, Instant};

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Opens (creating if needed) the database at `path`, then migrates it.
pub fn open_db(path: impl AsRef<Path>) -> DbResult<Connection> {
    let path = path.as_ref();
    timed("file", || {
        let mut conn = Connection::open(path)?;
        configure(&conn, true)?;
        apply_migrations(&mut conn)?;
        Ok(conn)
    })
}

/// Opens a private in-memory database, used by repository tests.
pub fn open_db_in_memory() -> DbResult<Connection> {
    timed("memory", || {
        let mut conn = Connection::open_in_memory()?;
        configure(&conn, false)?;
        apply_migrations(&mut conn)?;
        Ok(conn)
    })
}

fn configure(conn: &Connection, file_backed: bool) -> DbResult<()> {
    conn.pragma_update(None, "foreign_keys", true)?;
    conn.busy_timeout(BUSY_TIMEOUT)?;
    if file_backed {
        let mode: String =
            conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))?;
        info!("event=db_journal module=db status=ok journal_mode={mode}");
    }
    Ok(())
}

fn timed(mode: &str, open: impl FnOnce() -> DbResult<Connection>) -> DbResult<Connection> {
    let started_at = Instant::now();
    let result = open();
    let elapsed_ms = started_at.elapsed().as_millis();
    match &result {
        Ok(_) => info!("event=db_open module=db status=ok mode={mode} duration_ms={elapsed_ms}"),
        Err(err) => error!(
            "event=db_open module=db status=error mode={mode} duration_ms={elapsed_ms} error={err}"
        ),
    }
    result
}

//! Ordered schema steps for the task database.
//!
//! # Invariants
//! - Versions start at 1 and increase by exactly one per step.
//! - All pending steps commit together or not at all.

use super::{schema_version, DbError, DbResult};
use log::{debug, info};
use rusqlite::{Connection, TransactionBehavior};

struct Step {
    version: u32,
    name: &'static str,
    sql: &'static str,
}

const STEPS: &[Step] = &[
    Step {
        version: 1,
        name: "tasks",
        sql: include_str!("0001_init.sql"),
    },
    Step {
        version: 2,
        name: "app_flags",
        sql: include_str!("0002_app_flags.sql"),
    },
];

/// Highest schema version this build can write.
pub fn latest_version() -> u32 {
    STEPS.last().map_or(0, |step| step.version)
}

/// Runs every step newer than the stored version.
///
/// The writer and reader connections of one store may race here; the
/// version is re-read under an immediate (write-locking) transaction so only
/// the first one applies the steps.
pub fn apply_migrations(conn: &mut Connection) -> DbResult<()> {
    let supported = latest_version();
    let found = schema_version(conn)?;
    if found > supported {
        return Err(DbError::UnsupportedSchemaVersion { found, supported });
    }
    if found == supported {
        debug!("event=db_migrate module=db status=skip version={found}");
        return Ok(());
    }

    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    let start = schema_version(&tx)?;
    for step in STEPS.iter().filter(|step| step.version > start) {
        tx.execute_batch(step.sql)
            .and_then(|()| tx.pragma_update(None, "user_version", step.version))
            .map_err(|source| DbError::Migration {
                version: step.version,
                name: step.name,
                source,
            })?;
        debug!(
            "event=db_migration_step module=db status=ok version={} name={}",
            step.version, step.name
        );
    }
    tx.commit()?;

    info!("event=db_migrate module=db status=ok from_version={start} to_version={supported}");
    Ok(())
}

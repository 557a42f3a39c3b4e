use rusqlite::Connection;
use std::path::Path;
use std::sync::Arc;
use tasklist_core::db::migrations::latest_version;
use tasklist_core::db::{open_db, open_db_in_memory, schema_version, DbError};
use tasklist_core::{SqliteTaskStore, StoreError, StoreHandle};

fn stamp_future_schema(path: &Path) {
    let conn = Connection::open(path).unwrap();
    conn.pragma_update(None, "user_version", 999).unwrap();
}

fn columns(conn: &Connection, table: &str) -> Vec<String> {
    let mut stmt = conn
        .prepare(&format!("SELECT name FROM pragma_table_info('{table}') ORDER BY cid"))
        .unwrap();
    stmt.query_map([], |row| row.get(0))
        .unwrap()
        .map(Result::unwrap)
        .collect()
}

#[test]
fn fresh_database_has_task_and_flag_tables() {
    let conn = open_db_in_memory().unwrap();

    assert_eq!(schema_version(&conn).unwrap(), latest_version());
    assert_eq!(
        columns(&conn, "tasks"),
        ["id", "remote_id", "title", "description", "created_at", "is_completed"]
    );
    assert_eq!(columns(&conn, "app_flags"), ["key", "value", "updated_at"]);
}

#[test]
fn reopening_keeps_rows_and_version() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tasklist.db");

    let conn = open_db(&path).unwrap();
    conn.execute(
        "INSERT INTO app_flags (key, value) VALUES ('sample', 1)",
        [],
    )
    .unwrap();
    drop(conn);

    let conn = open_db(&path).unwrap();
    assert_eq!(schema_version(&conn).unwrap(), latest_version());
    let value: i64 = conn
        .query_row("SELECT value FROM app_flags WHERE key = 'sample'", [], |row| {
            row.get(0)
        })
        .unwrap();
    assert_eq!(value, 1);
}

#[test]
fn file_databases_use_wal_journal() {
    let dir = tempfile::tempdir().unwrap();
    let conn = open_db(dir.path().join("wal.db")).unwrap();

    let mode: String = conn
        .pragma_query_value(None, "journal_mode", |row| row.get(0))
        .unwrap();
    assert_eq!(mode.to_lowercase(), "wal");
}

#[test]
fn schema_rejects_out_of_range_booleans() {
    let conn = open_db_in_memory().unwrap();

    let bad_task = conn.execute(
        "INSERT INTO tasks (id, title, created_at, is_completed) VALUES ('t', 'x', 0, 2)",
        [],
    );
    let bad_flag = conn.execute("INSERT INTO app_flags (key, value) VALUES ('k', 7)", []);

    assert!(bad_task.is_err());
    assert!(bad_flag.is_err());
}

#[test]
fn newer_schema_is_refused() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("future.db");
    stamp_future_schema(&path);

    match open_db(&path).unwrap_err() {
        DbError::UnsupportedSchemaVersion { found, supported } => {
            assert_eq!(found, 999);
            assert_eq!(supported, latest_version());
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn store_and_handle_refuse_newer_schema() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("future.db");
    stamp_future_schema(&path);

    let err = SqliteTaskStore::open(&path).err().unwrap();
    assert!(matches!(err, StoreError::Repo(_)));

    let handle = StoreHandle::new(&path);
    assert!(handle.initialize().is_err());

    // A failed open is not cached: once the file is usable again, the same
    // handle opens it.
    Connection::open(&path)
        .unwrap()
        .pragma_update(None, "user_version", 0)
        .unwrap();
    let store = handle.initialize().unwrap();
    assert!(Arc::ptr_eq(&store, &handle.initialize().unwrap()));
}

#[test]
fn store_handle_initializes_once() {
    let dir = tempfile::tempdir().unwrap();
    let handle = StoreHandle::new(dir.path().join("tasklist.db"));

    let first = handle.initialize().unwrap();
    let second = handle.initialize().unwrap();
    assert!(Arc::ptr_eq(&first, &second));
}

use capsule_core::db::migrations::{current_user_version, latest_version};
use capsule_core::db::{open_db, open_db_in_memory, DbError};
use capsule_core::{DraftCapsule, KvStore, SqliteStore, StudyService};
use rusqlite::Connection;

#[test]
fn open_db_in_memory_applies_all_migrations() {
    let conn = open_db_in_memory().unwrap();

    assert_eq!(current_user_version(&conn).unwrap(), latest_version());
    assert_table_exists(&conn, "kv_entries");
}

#[test]
fn reopening_file_keeps_schema_and_data() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("capsules.sqlite3");

    let saved_id = {
        let conn = open_db(&path).unwrap();
        let service = StudyService::new(SqliteStore::new(&conn));
        let mut draft = DraftCapsule::new();
        draft.meta.title = "Persistent".to_string();
        draft.set_notes_from_text("survives reopen");
        service.save_capsule(&draft).unwrap().id
    };

    let conn = open_db(&path).unwrap();
    assert_eq!(current_user_version(&conn).unwrap(), latest_version());
    let service = StudyService::new(SqliteStore::new(&conn));
    let loaded = service.get_capsule(&saved_id).unwrap().unwrap();
    assert_eq!(loaded.notes, vec!["survives reopen"]);
    assert_eq!(service.list_capsules().unwrap().len(), 1);
}

#[test]
fn opening_database_with_newer_schema_version_returns_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("future.sqlite3");

    let conn = Connection::open(&path).unwrap();
    conn.execute_batch("PRAGMA user_version = 999;").unwrap();
    drop(conn);

    let err = open_db(&path).unwrap_err();
    match err {
        DbError::UnsupportedSchemaVersion {
            db_version,
            latest_supported,
        } => {
            assert_eq!(db_version, 999);
            assert_eq!(latest_supported, latest_version());
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn sqlite_store_tolerates_garbage_values() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteStore::new(&conn);
    store.set("pc_capsules_index", "\u{0}garbage").unwrap();
    store.set("pc_progress_x", "[1,2").unwrap();

    let service = StudyService::new(store);
    assert!(service.list_capsules().unwrap().is_empty());
    assert_eq!(service.get_progress("x").best_score, 0);
}

fn assert_table_exists(conn: &Connection, table_name: &str) {
    let exists: i64 = conn
        .query_row(
            "SELECT EXISTS(
                SELECT 1
                FROM sqlite_master
                WHERE type = 'table' AND name = ?1
            );",
            [table_name],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(exists, 1, "table {table_name} does not exist");
}

use zennote_core::db::migrations::latest_version;
use zennote_core::db::{open_db, open_db_in_memory, DbError};
use zennote_core::{KvStore, SqliteKvStore, WorkspaceService, WELCOME_NOTE_TITLE};
use rusqlite::Connection;

#[test]
fn open_db_in_memory_applies_all_migrations() {
    let conn = open_db_in_memory().unwrap();

    assert_eq!(schema_version(&conn), latest_version());
    let exists: i64 = conn
        .query_row(
            "SELECT EXISTS(
                SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = 'kv_entries'
            );",
            [],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(exists, 1);
}

#[test]
fn opening_database_with_newer_schema_version_returns_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("future.sqlite3");

    let conn = Connection::open(&path).unwrap();
    conn.execute_batch("PRAGMA user_version = 999;").unwrap();
    drop(conn);

    match open_db(&path).unwrap_err() {
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
fn entries_survive_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("zennote.sqlite3");

    {
        let conn = open_db(&path).unwrap();
        let store = SqliteKvStore::try_new(&conn).unwrap();
        store.put("note:Todo", "buy milk").unwrap();
        store.put("note:Todo", "buy oat milk").unwrap();
        store.put("note:Gone", "x").unwrap();
        store.delete("note:Gone").unwrap();
    }

    let conn = open_db(&path).unwrap();
    assert_eq!(schema_version(&conn), latest_version());
    let store = SqliteKvStore::try_new(&conn).unwrap();
    assert_eq!(
        store.get("note:Todo").unwrap().as_deref(),
        Some("buy oat milk")
    );
    assert_eq!(store.get("note:Gone").unwrap(), None);
    assert_eq!(store.keys().unwrap(), vec!["note:Todo".to_string()]);
}

#[test]
fn workspace_round_trips_through_sqlite_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("zennote.sqlite3");

    {
        let conn = open_db(&path).unwrap();
        let store = SqliteKvStore::try_new(&conn).unwrap();
        let mut workspace = WorkspaceService::open(store).unwrap();
        let note = workspace.create_note(None, Some("Ideas")).unwrap();
        workspace.set_content(note, "ship it").unwrap();
        workspace.save_note(note).unwrap();
        let welcome = workspace.tree().find_note(WELCOME_NOTE_TITLE).unwrap().id;
        workspace.delete_item(welcome).unwrap();
    }

    let conn = open_db(&path).unwrap();
    let store = SqliteKvStore::try_new(&conn).unwrap();
    let workspace = WorkspaceService::open(store).unwrap();

    assert!(workspace.can_restore_welcome());
    assert_eq!(workspace.tree().len(), 1);
    let ideas = workspace.tree().find_note("Ideas").unwrap();
    assert_eq!(ideas.content, "ship it");
    assert_eq!(workspace.tree().active_id(), None);
}

fn schema_version(conn: &Connection) -> u32 {
    conn.query_row("PRAGMA user_version;", [], |row| row.get(0))
        .unwrap()
}

use std::sync::Arc;
use todolist_core::db::{shared_connection, shared_db_path, DbError};
use todolist_core::{SqliteTaskStore, TaskStore};

// One test only: the shared handle is process-wide.
#[test]
fn shared_connection_opens_once_and_rejects_other_paths() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("task_database");
    assert!(shared_db_path().is_none());

    let first = shared_connection(&path).unwrap();
    let second = shared_connection(&path).unwrap();
    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(shared_db_path(), Some(path.clone()));

    let err = shared_connection(dir.path().join("other")).unwrap_err();
    assert!(matches!(err, DbError::SharedPathConflict { .. }));

    let store = SqliteTaskStore::try_from_shared(first).unwrap();
    let id = store.insert_task("Buy Milk").unwrap();
    let reader = SqliteTaskStore::try_from_shared(second).unwrap();
    assert_eq!(reader.get_task(id).unwrap().unwrap().title, "Buy Milk");
}

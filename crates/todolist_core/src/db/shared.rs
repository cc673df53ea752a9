//! Process-wide database handle.
//!
//! # Responsibility
//! - Open the task database at most once per process and share it.
//!
//! # Invariants
//! - Initialization is serialized; concurrent first callers open one file.
//! - Once bound, the handle never switches to another path.
//! - The handle lives until process exit; there is no mid-run teardown.

use super::open::open_db;
use super::{DbError, DbResult};
use log::info;
use once_cell::sync::OnceCell;
use rusqlite::Connection;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

/// Connection shared between the store and any other in-process reader.
pub type SharedConnection = Arc<Mutex<Connection>>;

struct SharedDb {
    path: PathBuf,
    conn: SharedConnection,
}

static SHARED_DB: OnceCell<SharedDb> = OnceCell::new();

/// Returns the shared connection, opening `path` on first use.
///
/// Later calls with the same path return the same handle.
///
/// # Errors
/// - Returns the open/migration error when first initialization fails; a
///   later call may retry.
/// - Returns `DbError::SharedPathConflict` when the handle is already bound
///   to a different path.
pub fn shared_connection(path: impl AsRef<Path>) -> DbResult<SharedConnection> {
    let requested = path.as_ref().to_path_buf();
    let shared = SHARED_DB.get_or_try_init(|| -> DbResult<SharedDb> {
        let conn = open_db(&requested)?;
        info!(
            "event=shared_db_init module=db status=ok path={}",
            requested.display()
        );
        Ok(SharedDb {
            path: requested.clone(),
            conn: Arc::new(Mutex::new(conn)),
        })
    })?;

    if shared.path != requested {
        return Err(DbError::SharedPathConflict {
            active: shared.path.clone(),
            requested,
        });
    }

    Ok(Arc::clone(&shared.conn))
}

/// Returns the path the shared handle is bound to, if any.
pub fn shared_db_path() -> Option<PathBuf> {
    SHARED_DB.get().map(|shared| shared.path.clone())
}

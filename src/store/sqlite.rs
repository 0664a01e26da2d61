//! SQLite-backed note store

use super::models::{Note, StoreError, APP_NAME, DB_FILE_NAME};
use super::traits::NoteStore;
use crate::profile::ProfileId;
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::{debug, info};

/// How long a statement waits on a lock held by another process (the CLI
/// and the host can have the file open at the same time)
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

const SCHEMA: &str = r#"
    PRAGMA journal_mode=WAL;
    CREATE TABLE IF NOT EXISTS note (
      profile TEXT NOT NULL PRIMARY KEY,
      text TEXT NOT NULL DEFAULT '',
      updated_at TEXT NULL
    );
"#;

/// Path of the note database: `<user data dir>/linkedin-notes-storage/linkedin_notes.db`.
///
/// Depends only on the platform and the fixed application name.
pub fn default_db_path() -> Result<PathBuf, StoreError> {
    let base = dirs::data_dir().ok_or(StoreError::NoDataDir)?;
    Ok(base.join(APP_NAME).join(DB_FILE_NAME))
}

/// Remove the database file together with its WAL side files.
///
/// Returns `false` if there was no database to delete.
pub fn delete_database(path: &Path) -> Result<bool, StoreError> {
    let existed = path.exists();
    for suffix in ["", "-wal", "-shm"] {
        let mut candidate = path.as_os_str().to_owned();
        candidate.push(suffix);
        let candidate = PathBuf::from(candidate);
        match std::fs::remove_file(&candidate) {
            Ok(()) => debug!("Removed {}", candidate.display()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(source) => {
                return Err(StoreError::Io {
                    path: candidate,
                    source,
                })
            }
        }
    }
    Ok(existed)
}

/// Note store over a single SQLite file.
///
/// The connection is opened on first use and then kept for the life of the
/// store. If opening fails the error is returned and the next call tries
/// again.
#[derive(Clone)]
pub struct SqliteNoteStore {
    path: PathBuf,
    conn: Arc<Mutex<Option<Connection>>>,
}

impl SqliteNoteStore {
    /// Create a store for the database at `path`. Nothing is touched on disk
    /// until the first operation.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            conn: Arc::new(Mutex::new(None)),
        }
    }

    /// Store at [`default_db_path`]
    pub fn open_default() -> Result<Self, StoreError> {
        Ok(Self::new(default_db_path()?))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Run `f` against the shared connection on the blocking thread pool.
    async fn with_conn<T, F>(&self, f: F) -> Result<T, StoreError>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> Result<T, StoreError> + Send + 'static,
    {
        let slot = Arc::clone(&self.conn);
        let path = self.path.clone();
        tokio::task::spawn_blocking(move || {
            let mut guard = slot.lock().map_err(|_| StoreError::Poisoned)?;
            let conn = match guard.take() {
                Some(conn) => conn,
                None => open_connection(&path)?,
            };
            let result = f(&conn);
            *guard = Some(conn);
            result
        })
        .await?
    }
}

fn open_connection(path: &Path) -> Result<Connection, StoreError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|source| StoreError::Io {
            path: parent.to_path_buf(),
            source,
        })?;
    }

    info!("Connecting to database: {}", path.display());
    let conn = Connection::open(path)?;
    conn.busy_timeout(BUSY_TIMEOUT)?;
    conn.execute_batch(SCHEMA)?;
    ensure_columns(&conn, "note", &[("updated_at", "TEXT NULL")])?;
    Ok(conn)
}

/// Add columns missing from databases created by older versions.
fn ensure_columns(conn: &Connection, table: &str, cols: &[(&str, &str)]) -> Result<(), StoreError> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({table})"))?;
    let existing = stmt
        .query_map([], |row| row.get::<_, String>(1))?
        .collect::<Result<std::collections::HashSet<_>, _>>()?;
    for (name, ty) in cols {
        if !existing.contains(*name) {
            info!("Adding column {} to table {}", name, table);
            conn.execute(&format!("ALTER TABLE {table} ADD COLUMN {name} {ty}"), [])?;
        }
    }
    Ok(())
}

fn parse_timestamp(raw: Option<String>) -> Option<DateTime<Utc>> {
    raw.and_then(|s| DateTime::parse_from_rfc3339(&s).ok())
        .map(|dt| dt.with_timezone(&Utc))
}

#[async_trait]
impl NoteStore for SqliteNoteStore {
    async fn read_latest(&self, profile: &ProfileId) -> Result<Option<String>, StoreError> {
        let key = profile.as_str().to_string();
        self.with_conn(move |conn| {
            let text = conn
                .query_row(
                    "SELECT text FROM note WHERE profile = ?1",
                    params![key],
                    |row| row.get::<_, String>(0),
                )
                .optional()?;
            Ok(text)
        })
        .await
    }

    async fn write(&self, profile: &ProfileId, text: &str) -> Result<(), StoreError> {
        let key = profile.as_str().to_string();
        let text = text.to_string();
        let now = Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true);
        self.with_conn(move |conn| {
            conn.execute(
                "INSERT INTO note (profile, text, updated_at) VALUES (?1, ?2, ?3)
                 ON CONFLICT(profile) DO UPDATE SET text = excluded.text, updated_at = excluded.updated_at",
                params![key, text, now],
            )?;
            Ok(())
        })
        .await
    }

    async fn list(&self) -> Result<Vec<Note>, StoreError> {
        self.with_conn(|conn| {
            let mut stmt =
                conn.prepare("SELECT profile, text, updated_at FROM note ORDER BY profile")?;
            let notes = stmt
                .query_map([], |row| {
                    Ok(Note {
                        profile: row.get(0)?,
                        text: row.get(1)?,
                        updated_at: parse_timestamp(row.get(2)?),
                    })
                })?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(notes)
        })
        .await
    }
}

// ============================================================================
// Tests
// ============================================================================

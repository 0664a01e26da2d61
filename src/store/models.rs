//! Note store models and errors

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::PathBuf;
use thiserror::Error;

/// Application identifier used to derive the data directory
pub const APP_NAME: &str = "linkedin-notes-storage";

/// File name of the note database inside the data directory
pub const DB_FILE_NAME: &str = "linkedin_notes.db";

/// A stored note.
///
/// `profile` is the key exactly as stored. Rows written through
/// [`NoteStore::write`](super::NoteStore::write) always hold a canonical
/// `in/<handle>/` key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Note {
    pub profile: String,
    pub text: String,
    /// Time of the last write; absent for rows written before timestamps
    /// were recorded
    pub updated_at: Option<DateTime<Utc>>,
}

/// The durable store could not be reached or could not complete an operation.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("cannot determine the user data directory")]
    NoDataDir,

    #[error("cannot prepare database location {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("note store connection lock poisoned")]
    Poisoned,

    #[error("storage task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

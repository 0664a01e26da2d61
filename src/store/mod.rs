//! Note storage
//!
//! One current note per profile, persisted in a SQLite file under the
//! user's data directory. The [`NoteStore`] trait is the seam the native
//! messaging host and the CLI talk to; [`SqliteNoteStore`] is the real
//! backend.

pub mod models;
pub mod sqlite;
pub mod traits;

pub use models::*;
pub use sqlite::{default_db_path, delete_database, SqliteNoteStore};
pub use traits::NoteStore;

#[cfg(test)]
pub(crate) mod mock;

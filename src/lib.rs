//! LinkedIn Notes Storage
//!
//! Local persistence backend for the LinkedIn Notes browser extension:
//! - Profile identifier normalization (one key per profile, whatever URL or
//!   handle form the extension saw)
//! - SQLite note store under the user's data directory
//! - Native messaging host serving the store over framed stdin/stdout
//! - Host manifest registration for Chrome, Chromium and Firefox

pub mod host;
pub mod logging;
pub mod profile;
pub mod setup;
pub mod store;

pub use profile::{normalize, InvalidProfile, ProfileId};
pub use store::{NoteStore, SqliteNoteStore};

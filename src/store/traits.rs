//! NoteStore trait definition

use super::models::{Note, StoreError};
use crate::profile::ProfileId;
use async_trait::async_trait;

/// Abstract interface for note persistence.
///
/// Keys are always [`ProfileId`]s, so callers must normalize before they can
/// touch the store.
#[async_trait]
pub trait NoteStore: Send + Sync {
    /// Latest text stored for `profile`, or `None` if it was never written.
    ///
    /// An `Err` means the store is unavailable and must not be read as
    /// "no note".
    async fn read_latest(&self, profile: &ProfileId) -> Result<Option<String>, StoreError>;

    /// Replace the note for `profile` with `text`, creating it if needed.
    /// Either the whole write becomes visible or none of it does.
    async fn write(&self, profile: &ProfileId, text: &str) -> Result<(), StoreError>;

    /// All stored notes ordered by profile
    async fn list(&self) -> Result<Vec<Note>, StoreError>;
}

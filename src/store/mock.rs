//! In-memory mock implementation of NoteStore for testing.
//!
//! Failure switches let tests drive the storage-unavailable paths.

use super::models::{Note, StoreError};
use super::traits::NoteStore;
use crate::profile::ProfileId;
use async_trait::async_trait;
use chrono::Utc;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::RwLock;

#[derive(Default)]
pub struct MockNoteStore {
    pub notes: RwLock<BTreeMap<String, Note>>,
    pub fail_reads: AtomicBool,
    pub fail_writes: AtomicBool,
}

impl MockNoteStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store whose every operation fails
    pub fn unavailable() -> Self {
        let store = Self::new();
        store.fail_reads.store(true, Ordering::SeqCst);
        store.fail_writes.store(true, Ordering::SeqCst);
        store
    }

    fn check(flag: &AtomicBool) -> Result<(), StoreError> {
        if flag.load(Ordering::SeqCst) {
            return Err(StoreError::Poisoned);
        }
        Ok(())
    }
}

#[async_trait]
impl NoteStore for MockNoteStore {
    async fn read_latest(&self, profile: &ProfileId) -> Result<Option<String>, StoreError> {
        Self::check(&self.fail_reads)?;
        Ok(self
            .notes
            .read()
            .await
            .get(profile.as_str())
            .map(|n| n.text.clone()))
    }

    async fn write(&self, profile: &ProfileId, text: &str) -> Result<(), StoreError> {
        Self::check(&self.fail_writes)?;
        self.notes.write().await.insert(
            profile.to_string(),
            Note {
                profile: profile.to_string(),
                text: text.to_string(),
                updated_at: Some(Utc::now()),
            },
        );
        Ok(())
    }

    async fn list(&self) -> Result<Vec<Note>, StoreError> {
        Self::check(&self.fail_reads)?;
        Ok(self.notes.read().await.values().cloned().collect())
    }
}

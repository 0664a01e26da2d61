//! Query dispatch
//!
//! Turns a decoded [`Request`] into a [`Response`] by normalizing the
//! profile and calling the note store. Write failures of any kind become
//! `success: false`, and a stored note too large to send reads as absent.
//! Only an unavailable store on the read path escapes as an error.

use super::framing::MAX_OUTBOUND_FRAME;
use super::protocol::{Request, Response};
use super::HostError;
use crate::profile::ProfileId;
use crate::store::NoteStore;
use std::sync::Arc;
use tracing::{error, info, warn};

/// Dispatches requests to a note store
pub struct QueryHandler {
    store: Arc<dyn NoteStore>,
}

impl QueryHandler {
    pub fn new(store: Arc<dyn NoteStore>) -> Self {
        Self { store }
    }

    pub async fn handle(&self, request: Request) -> Result<Response, HostError> {
        match request {
            Request::Read { profile } => self.handle_read(&profile).await,
            Request::Write { profile, text } => Ok(self.handle_write(&profile, &text).await),
        }
    }

    async fn handle_read(&self, raw_profile: &str) -> Result<Response, HostError> {
        // Nothing can be stored under an invalid key, so it reads as absent
        let profile = match ProfileId::parse(raw_profile) {
            Ok(p) => p,
            Err(e) => {
                warn!("Read for invalid profile answered as no note: {}", e);
                return Ok(Response::read(None));
            }
        };

        info!("Reading note for profile: {}", profile);
        match self.store.read_latest(&profile).await {
            Ok(Some(text)) if !fits_in_read_response(&text) => {
                // Stored before the size limit existed; sending it would end the session
                error!(
                    "Note for {} is {} bytes and cannot be sent, answering as no note",
                    profile,
                    text.len()
                );
                Ok(Response::read(None))
            }
            Ok(Some(text)) => {
                info!("Note read successfully");
                Ok(Response::read(Some(text)))
            }
            Ok(None) => {
                info!("No note found for profile: {}", profile);
                Ok(Response::read(None))
            }
            Err(source) => {
                error!("Failed to read note for {}: {}", profile, source);
                Err(HostError::StorageUnavailable { profile, source })
            }
        }
    }

    async fn handle_write(&self, raw_profile: &str, text: &str) -> Response {
        let profile = match ProfileId::parse(raw_profile) {
            Ok(p) => p,
            Err(e) => {
                warn!("Failed to write note: {}", e);
                return Response::write(false);
            }
        };

        if !fits_in_read_response(text) {
            warn!(
                "Refusing note for {}: {} bytes would not fit in a read response",
                profile,
                text.len()
            );
            return Response::write(false);
        }

        info!("Writing note for profile: {}", profile);
        match self.store.write(&profile, text).await {
            Ok(()) => {
                info!("Note written successfully");
                Response::write(true)
            }
            Err(e) => {
                error!("Failed to write note for {}: {}", profile, e);
                Response::write(false)
            }
        }
    }
}

/// Whether a note with this text can later be sent back to the browser.
fn fits_in_read_response(text: &str) -> bool {
    serde_json::to_vec(&Response::read(Some(text.to_string())))
        .map(|encoded| encoded.len() <= MAX_OUTBOUND_FRAME)
        .unwrap_or(false)
}

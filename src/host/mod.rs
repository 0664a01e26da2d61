//! Native messaging host
//!
//! Serves the note store to the browser extension over the native messaging
//! convention: every message in either direction is a 4-byte native-order
//! length followed by that many bytes of UTF-8 JSON.
//!
//! The loop is strictly request/response. One query is decoded, dispatched
//! and answered (and the answer flushed) before the next one is read.

pub mod framing;
pub mod handlers;
pub mod protocol;
pub mod server;

pub use framing::ProtocolError;
pub use handlers::QueryHandler;
pub use protocol::*;
pub use server::{run_stdio, NativeHost};

use crate::profile::ProfileId;
use crate::store::StoreError;
use thiserror::Error;

/// Failures that end the session.
///
/// Everything else (bad profiles, failed writes) is folded into the response
/// so the extension always gets an answer.
#[derive(Debug, Error)]
pub enum HostError {
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// Reported instead of answering `text: null`, which the extension would
    /// take as "no note"
    #[error("note store unavailable while reading {profile}: {source}")]
    StorageUnavailable {
        profile: ProfileId,
        #[source]
        source: StoreError,
    },
}

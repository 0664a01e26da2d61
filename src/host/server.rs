//! Native messaging host loop
//!
//! Reads framed queries, answers each one, and stops at end of input.

use super::framing::{decode_query, encode_response, read_frame, write_frame};
use super::handlers::QueryHandler;
use super::HostError;
use crate::store::NoteStore;
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncWrite, BufReader};
use tracing::{debug, info};

/// Request/response loop over a pair of byte streams
pub struct NativeHost {
    handler: QueryHandler,
}

impl NativeHost {
    pub fn new(store: Arc<dyn NoteStore>) -> Self {
        Self {
            handler: QueryHandler::new(store),
        }
    }

    /// Serve queries until the input ends.
    ///
    /// Returns `Ok(())` when the caller closes the stream (or sends an empty
    /// frame). Any error is fatal: once a length prefix has been consumed
    /// there is no way to find the next frame boundary.
    ///
    /// Reads have no timeout. A caller that sends a length prefix and never
    /// the payload blocks the loop.
    pub async fn run<R, W>(&self, mut reader: R, mut writer: W) -> Result<(), HostError>
    where
        R: AsyncRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        loop {
            let Some(payload) = read_frame(&mut reader).await? else {
                info!("Input closed, shutting down");
                return Ok(());
            };
            if payload.is_empty() {
                info!("Received empty frame, closing session");
                return Ok(());
            }

            debug!("Received: {}", String::from_utf8_lossy(&payload));
            let request = decode_query(&payload)?;
            info!(
                "Received query: mode={} profile={}",
                request.mode(),
                request.profile()
            );

            let response = self.handler.handle(request).await?;
            let encoded = encode_response(&response)?;
            debug!("Sending: {}", String::from_utf8_lossy(&encoded));
            write_frame(&mut writer, &encoded).await?;
        }
    }
}

/// Serve the browser on this process's stdin and stdout.
pub async fn run_stdio(store: Arc<dyn NoteStore>) -> Result<(), HostError> {
    info!("Native messaging host starting on stdio");
    let host = NativeHost::new(store);
    host.run(BufReader::new(tokio::io::stdin()), tokio::io::stdout())
        .await
}

//! Native messaging host binary
//!
//! This is the executable named in the browser's host manifest. The browser
//! starts it when the extension calls `connectNative` and talks to it over
//! stdin/stdout until the port is closed.
//!
//! # Usage
//!
//! ```bash
//! # Register with the browser (writes the host manifest)
//! linkedin-notes-storage setup --extension-id <ID>
//!
//! # With debug logging (shows up in the browser's stderr log)
//! RUST_LOG=linkedin_notes_storage=debug linkedin-notes-host
//! ```

use anyhow::Result;
use clap::Parser;
use linkedin_notes_storage::host::run_stdio;
use linkedin_notes_storage::store::SqliteNoteStore;
use std::sync::Arc;
use tracing::{debug, error};

/// Native messaging host for LinkedIn Notes
#[derive(Parser, Debug)]
#[command(name = "linkedin-notes-host")]
#[command(about = "Native messaging host serving LinkedIn Notes storage over stdio")]
#[command(version)]
struct Args {
    /// Arguments supplied by the browser (caller origin, manifest path,
    /// parent window handle); accepted and ignored
    #[arg(trailing_var_arg = true, allow_hyphen_values = true, hide = true)]
    caller: Vec<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    linkedin_notes_storage::logging::init();

    let args = Args::parse();
    debug!("Launched with caller arguments: {:?}", args.caller);

    let store = SqliteNoteStore::open_default()?;

    if let Err(e) = run_stdio(Arc::new(store)).await {
        error!("Native messaging host error: {}", e);
        return Err(e.into());
    }

    Ok(())
}

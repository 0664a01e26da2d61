//! LinkedIn Notes Storage - CLI
//!
//! Inspect and export the note database, register the native messaging
//! host, or run the host directly.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use linkedin_notes_storage::profile::ProfileId;
use linkedin_notes_storage::setup::{self, Browser, SetupOptions, SetupResult};
use linkedin_notes_storage::store::{self, Note, NoteStore, SqliteNoteStore};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Longest note preview shown by `database list`
const PREVIEW_CHARS: usize = 60;

#[derive(Parser)]
#[command(name = "linkedin-notes-storage")]
#[command(about = "Local storage backend for the LinkedIn Notes extension")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the native messaging host on stdin/stdout
    Run,

    /// Database operations
    Database {
        #[command(subcommand)]
        action: DatabaseAction,
    },

    /// Register the native messaging host with a browser
    Setup {
        /// Browser to register with
        #[arg(short, long, value_enum, default_value_t = Browser::Chrome)]
        browser: Browser,

        /// ID of the installed extension allowed to connect
        #[arg(long)]
        extension_id: String,

        /// Absolute path of the host executable (defaults to the one
        /// installed next to this program)
        #[arg(long)]
        host_path: Option<PathBuf>,

        /// Replace an existing manifest (a .bak copy is kept)
        #[arg(long)]
        overwrite: bool,

        /// Show what would be written without touching anything
        #[arg(long)]
        dry_run: bool,
    },
}

#[derive(Subcommand)]
enum DatabaseAction {
    /// Print the path to the database file
    Path,

    /// Show the note for a profile
    Query {
        /// Handle, in/<handle>/ path or profile URL
        profile: String,
    },

    /// List all notes
    List,

    /// Export all notes as JSON
    Export {
        /// Output file (stdout if omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Delete the database file
    Delete {
        /// Confirm deletion
        #[arg(long)]
        yes: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    linkedin_notes_storage::logging::init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run => run_host().await,
        Commands::Database { action } => handle_database(action).await,
        Commands::Setup {
            browser,
            extension_id,
            host_path,
            overwrite,
            dry_run,
        } => handle_setup(SetupOptions {
            browser,
            extension_id,
            host_path,
            overwrite,
            dry_run,
        }),
    }
}

async fn run_host() -> Result<()> {
    let store = SqliteNoteStore::open_default()?;
    if let Err(e) = linkedin_notes_storage::host::run_stdio(Arc::new(store)).await {
        tracing::error!("Native messaging host error: {}", e);
        return Err(e.into());
    }
    Ok(())
}

async fn handle_database(action: DatabaseAction) -> Result<()> {
    let db_path = store::default_db_path()?;

    match action {
        DatabaseAction::Path => {
            println!("{}", db_path.display());
        }

        DatabaseAction::Query { profile } => {
            let profile = ProfileId::parse(&profile)?;
            let store = SqliteNoteStore::new(&db_path);
            match store.read_latest(&profile).await? {
                Some(text) => println!("{}", text),
                None => println!("No note for {}", profile),
            }
        }

        DatabaseAction::List => {
            let notes = SqliteNoteStore::new(&db_path).list().await?;
            println!("{:<40} {:<20} {}", "PROFILE", "UPDATED", "NOTE");
            println!("{}", "-".repeat(100));
            for note in &notes {
                println!(
                    "{:<40} {:<20} {}",
                    note.profile,
                    note.updated_at
                        .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
                        .unwrap_or_else(|| "-".into()),
                    preview(&note.text)
                );
            }
            tracing::info!("{} notes", notes.len());
        }

        DatabaseAction::Export { output } => {
            let notes = SqliteNoteStore::new(&db_path).list().await?;
            export_notes(&notes, output.as_deref())?;
        }

        DatabaseAction::Delete { yes } => {
            if !db_path.exists() {
                tracing::warn!("Database does not exist: {}", db_path.display());
                return Ok(());
            }
            if !yes {
                bail!(
                    "Refusing to delete {} without --yes",
                    db_path.display()
                );
            }
            tracing::info!("Deleting database: {}", db_path.display());
            store::delete_database(&db_path)?;
            println!("Database deleted.");
        }
    }

    Ok(())
}

fn handle_setup(options: SetupOptions) -> Result<()> {
    match setup::setup_host(&options)? {
        SetupResult::Written { path, backup } => {
            if let Some(backup) = backup {
                println!("Previous manifest saved to {}", backup.display());
            }
            println!(
                "Registered native messaging host for {} at {}",
                options.browser,
                path.display()
            );
        }
        SetupResult::DryRun { path, contents } => {
            println!("Would write {}:", path.display());
            println!("{}", contents);
        }
    }
    Ok(())
}

fn export_notes(notes: &[Note], output: Option<&Path>) -> Result<()> {
    let json = serde_json::to_string_pretty(notes).context("Failed to serialize notes")?;
    match output {
        Some(path) => {
            std::fs::write(path, json)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            tracing::info!("Exported {} notes to {}", notes.len(), path.display());
        }
        None => println!("{}", json),
    }
    Ok(())
}

/// First line of the note, cut to [`PREVIEW_CHARS`]
fn preview(text: &str) -> String {
    let line = text.lines().next().unwrap_or("");
    let mut out: String = line.chars().take(PREVIEW_CHARS).collect();
    if line.chars().count() > PREVIEW_CHARS || text.lines().nth(1).is_some() {
        out.push_str("...");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preview_short_note() {
        assert_eq!(preview("hello"), "hello");
        assert_eq!(preview(""), "");
    }

    #[test]
    fn test_preview_truncates() {
        let long = "é".repeat(PREVIEW_CHARS + 5);
        let p = preview(&long);
        assert_eq!(p.chars().count(), PREVIEW_CHARS + 3);
        assert!(p.ends_with("..."));
        assert_eq!(preview("first\nsecond"), "first...");
    }

    #[test]
    fn test_cli_parses_database_query() {
        let cli = Cli::try_parse_from(["linkedin-notes-storage", "database", "query", "someone"])
            .unwrap();
        assert!(matches!(
            cli.command,
            Commands::Database {
                action: DatabaseAction::Query { .. }
            }
        ));
    }

    #[test]
    fn test_cli_setup_requires_extension_id() {
        assert!(Cli::try_parse_from(["linkedin-notes-storage", "setup"]).is_err());
        let cli = Cli::try_parse_from([
            "linkedin-notes-storage",
            "setup",
            "--browser",
            "firefox",
            "--extension-id",
            "notes@example.org",
        ])
        .unwrap();
        match cli.command {
            Commands::Setup { browser, .. } => assert_eq!(browser, Browser::Firefox),
            _ => panic!("expected setup"),
        }
    }
}

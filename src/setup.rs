//! Native messaging host registration.
//!
//! Browsers only launch a native host that is described by a manifest file
//! in a browser-specific directory. This module writes that manifest,
//! pointing it at the `linkedin-notes-host` executable.

use anyhow::{bail, Context, Result};
use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};

// ============================================================================
// Types
// ============================================================================

/// Name the extension passes to `connectNative`
pub const HOST_NAME: &str = "com.jayqi.linkedin_notes_storage";

/// Executable the manifest points at
pub const HOST_BINARY: &str = "linkedin-notes-host";

const HOST_DESCRIPTION: &str = "Local storage for LinkedIn Notes";

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Browser {
    Chrome,
    Chromium,
    Firefox,
}

impl fmt::Display for Browser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Chrome => write!(f, "chrome"),
            Self::Chromium => write!(f, "chromium"),
            Self::Firefox => write!(f, "firefox"),
        }
    }
}

/// Operating systems with a file-based manifest location
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum System {
    Linux,
    MacOs,
}

impl System {
    pub fn current() -> Result<Self> {
        match std::env::consts::OS {
            "linux" => Ok(Self::Linux),
            "macos" => Ok(Self::MacOs),
            // Windows registers hosts through the registry instead
            other => bail!("Unsupported system: {}", other),
        }
    }
}

/// Contents of the host manifest.
///
/// Chromium-family browsers identify the extension by origin, Firefox by
/// extension ID.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HostManifest {
    pub name: String,
    pub description: String,
    pub path: PathBuf,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allowed_origins: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allowed_extensions: Option<Vec<String>>,
}

impl HostManifest {
    pub fn new(browser: Browser, host_path: &Path, extension_id: &str) -> Self {
        let (allowed_origins, allowed_extensions) = match browser {
            Browser::Chrome | Browser::Chromium => (
                Some(vec![format!("chrome-extension://{}/", extension_id)]),
                None,
            ),
            Browser::Firefox => (None, Some(vec![extension_id.to_string()])),
        };
        Self {
            name: HOST_NAME.to_string(),
            description: HOST_DESCRIPTION.to_string(),
            path: host_path.to_path_buf(),
            kind: "stdio".to_string(),
            allowed_origins,
            allowed_extensions,
        }
    }
}

/// Options for [`setup_host`]
#[derive(Debug, Clone)]
pub struct SetupOptions {
    pub browser: Browser,
    pub extension_id: String,
    /// Host executable; defaults to [`HOST_BINARY`] next to the running program
    pub host_path: Option<PathBuf>,
    pub overwrite: bool,
    pub dry_run: bool,
}

/// Result of the setup operation.
#[derive(Debug, PartialEq, Eq)]
pub enum SetupResult {
    /// Manifest written (or replaced, with the old one kept at `backup`)
    Written {
        path: PathBuf,
        backup: Option<PathBuf>,
    },
    /// Dry run: nothing was touched
    DryRun { path: PathBuf, contents: String },
}

// ============================================================================
// Public API
// ============================================================================

/// Register the native messaging host for the current user and system.
pub fn setup_host(options: &SetupOptions) -> Result<SetupResult> {
    let system = System::current()?;
    let home = dirs::home_dir().context("Cannot determine home directory")?;
    let manifest_path = manifest_dir(system, options.browser, &home).join(manifest_file_name());

    let host_path = match &options.host_path {
        Some(p) => p.clone(),
        None => default_host_path()?,
    };
    if !host_path.is_absolute() {
        bail!(
            "Host path must be absolute, got {} (browsers resolve it without a working directory)",
            host_path.display()
        );
    }
    if !host_path.exists() {
        tracing::warn!("Host executable not found at {}", host_path.display());
    }

    let manifest = HostManifest::new(options.browser, &host_path, &options.extension_id);
    write_manifest_at(&manifest_path, &manifest, options.overwrite, options.dry_run)
}

pub fn manifest_file_name() -> String {
    format!("{}.json", HOST_NAME)
}

/// Directory where `browser` looks for host manifests on `system`.
pub fn manifest_dir(system: System, browser: Browser, home: &Path) -> PathBuf {
    let relative = match (system, browser) {
        (System::Linux, Browser::Chrome) => ".config/google-chrome/NativeMessagingHosts",
        (System::Linux, Browser::Chromium) => ".config/chromium/NativeMessagingHosts",
        (System::Linux, Browser::Firefox) => ".mozilla/native-messaging-hosts",
        (System::MacOs, Browser::Chrome) => {
            "Library/Application Support/Google/Chrome/NativeMessagingHosts"
        }
        (System::MacOs, Browser::Chromium) => {
            "Library/Application Support/Chromium/NativeMessagingHosts"
        }
        (System::MacOs, Browser::Firefox) => {
            "Library/Application Support/Mozilla/NativeMessagingHosts"
        }
    };
    home.join(relative)
}

/// The host binary shipped alongside the running executable.
fn default_host_path() -> Result<PathBuf> {
    let exe = std::env::current_exe().context("Cannot locate the running executable")?;
    let mut path = exe.with_file_name(HOST_BINARY);
    if let Some(ext) = exe.extension() {
        path.set_extension(ext);
    }
    Ok(path)
}

// ============================================================================
// File writing
// ============================================================================

/// Internal implementation that accepts a path (for testability).
fn write_manifest_at(
    path: &Path,
    manifest: &HostManifest,
    overwrite: bool,
    dry_run: bool,
) -> Result<SetupResult> {
    let formatted =
        serde_json::to_string_pretty(manifest).context("Failed to serialize host manifest")?;

    let exists = path.exists();
    if exists && !overwrite {
        bail!(
            "A host manifest already exists at {}; pass --overwrite to replace it",
            path.display()
        );
    }

    if dry_run {
        tracing::info!("Dry run: would write host manifest to {}", path.display());
        return Ok(SetupResult::DryRun {
            path: path.to_path_buf(),
            contents: formatted,
        });
    }

    let backup = if exists {
        let backup_path = path.with_extension("json.bak");
        std::fs::copy(path, &backup_path).context("Failed to create backup of host manifest")?;
        tracing::info!("Backup created at: {}", backup_path.display());
        Some(backup_path)
    } else {
        None
    };

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }

    std::fs::write(path, formatted).context("Failed to write host manifest")?;
    tracing::info!("Host manifest written to: {}", path.display());

    Ok(SetupResult::Written {
        path: path.to_path_buf(),
        backup,
    })
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;
    use tempfile::TempDir;

    const EXTENSION_ID: &str = "abcdefghijklmnopabcdefghijklmnop";

    fn manifest(browser: Browser) -> HostManifest {
        HostManifest::new(browser, Path::new("/opt/notes/linkedin-notes-host"), EXTENSION_ID)
    }

    #[test]
    fn test_chrome_manifest_uses_origins() {
        let json = serde_json::to_value(manifest(Browser::Chrome)).unwrap();
        assert_eq!(json["name"], HOST_NAME);
        assert_eq!(json["type"], "stdio");
        assert_eq!(json["path"], "/opt/notes/linkedin-notes-host");
        assert_eq!(
            json["allowed_origins"][0],
            format!("chrome-extension://{}/", EXTENSION_ID)
        );
        assert!(json.get("allowed_extensions").is_none());
    }

    #[test]
    fn test_firefox_manifest_uses_extension_ids() {
        let json = serde_json::to_value(manifest(Browser::Firefox)).unwrap();
        assert_eq!(json["allowed_extensions"][0], EXTENSION_ID);
        assert!(json.get("allowed_origins").is_none());
    }

    #[test]
    fn test_manifest_dirs() {
        let home = Path::new("/home/me");
        assert_eq!(
            manifest_dir(System::Linux, Browser::Chrome, home),
            Path::new("/home/me/.config/google-chrome/NativeMessagingHosts")
        );
        assert_eq!(
            manifest_dir(System::Linux, Browser::Firefox, home),
            Path::new("/home/me/.mozilla/native-messaging-hosts")
        );
        assert_eq!(
            manifest_dir(System::MacOs, Browser::Chrome, home),
            Path::new("/home/me/Library/Application Support/Google/Chrome/NativeMessagingHosts")
        );
    }

    #[test]
    fn test_write_new_manifest_creates_directories() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("a").join("b").join(manifest_file_name());

        let result = write_manifest_at(&path, &manifest(Browser::Chrome), false, false).unwrap();
        assert_eq!(
            result,
            SetupResult::Written {
                path: path.clone(),
                backup: None
            }
        );

        let json: Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(json["name"], HOST_NAME);
    }

    #[test]
    fn test_existing_manifest_requires_overwrite() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join(manifest_file_name());
        std::fs::write(&path, "{}").unwrap();

        assert!(write_manifest_at(&path, &manifest(Browser::Chrome), false, false).is_err());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "{}");
    }

    #[test]
    fn test_overwrite_keeps_backup() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join(manifest_file_name());
        std::fs::write(&path, "{\"old\": true}").unwrap();

        let result = write_manifest_at(&path, &manifest(Browser::Chrome), true, false).unwrap();
        let backup_path = path.with_extension("json.bak");
        assert_eq!(
            result,
            SetupResult::Written {
                path: path.clone(),
                backup: Some(backup_path.clone())
            }
        );
        assert_eq!(
            std::fs::read_to_string(&backup_path).unwrap(),
            "{\"old\": true}"
        );
        let json: Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(json["type"], "stdio");
    }

    #[test]
    fn test_dry_run_touches_nothing() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("dir").join(manifest_file_name());

        let result = write_manifest_at(&path, &manifest(Browser::Firefox), false, true).unwrap();
        match result {
            SetupResult::DryRun { contents, .. } => assert!(contents.contains(EXTENSION_ID)),
            other => panic!("unexpected result: {:?}", other),
        }
        assert!(!path.exists());
        assert!(!tmp.path().join("dir").exists());
    }
}

//! Profile identifier normalization
//!
//! Every note is keyed by a canonical `in/<handle>/` string. Callers hand us
//! profiles in several shapes (a bare handle, a path fragment, a full profile
//! URL from any LinkedIn locale) and all of them must land on the same key.

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use url::Url;

/// Path prefix shared by every canonical profile identifier.
const PROFILE_PREFIX: &str = "in/";

/// Host suffix a profile URL must carry.
const PROFILE_HOST_SUFFIX: &str = "linkedin.com";

// ============================================================================
// Errors
// ============================================================================

/// The input could not be canonicalized into a [`ProfileId`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid profile {raw:?}: {reason}")]
pub struct InvalidProfile {
    raw: String,
    reason: &'static str,
}

impl InvalidProfile {
    fn new(raw: &str, reason: &'static str) -> Self {
        Self {
            raw: raw.to_string(),
            reason,
        }
    }

    /// The input exactly as the caller supplied it
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// Short human-readable explanation of the rejection
    pub fn reason(&self) -> &'static str {
        self.reason
    }
}

// ============================================================================
// ProfileId
// ============================================================================

/// Canonical profile identifier of the form `in/<handle>/`.
///
/// The handle is kept exactly as given (no case folding). A `ProfileId` can
/// only be obtained through [`normalize`], so holding one means the key is
/// valid for the note store.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct ProfileId(String);

impl ProfileId {
    /// Normalize `raw` into a canonical identifier.
    pub fn parse(raw: &str) -> Result<Self, InvalidProfile> {
        normalize(raw)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The handle segment between `in/` and the trailing slash
    pub fn handle(&self) -> &str {
        &self.0[PROFILE_PREFIX.len()..self.0.len() - 1]
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for ProfileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ProfileId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl FromStr for ProfileId {
    type Err = InvalidProfile;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        normalize(s)
    }
}

impl<'de> Deserialize<'de> for ProfileId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        normalize(&raw).map_err(serde::de::Error::custom)
    }
}

// ============================================================================
// Normalization
// ============================================================================

/// Turn any accepted representation of a profile into its canonical key.
///
/// Accepted inputs:
/// - a bare handle: `username`
/// - a path fragment: `in/username`, `/in/username/`
/// - a profile URL on any `linkedin.com` host:
///   `https://www.linkedin.com/in/username/?trk=x#about`
///
/// The handle is stored percent-decoded, so `josé`, `/in/jos%C3%A9/` (what
/// browsers report as `location.pathname`) and the profile URL all share one
/// key. Dot segments (`.`, `..`) are rejected rather than resolved.
pub fn normalize(raw: &str) -> Result<ProfileId, InvalidProfile> {
    if has_dot_segment(raw) {
        return Err(InvalidProfile::new(raw, "path contains a dot segment"));
    }

    let path = match Url::parse(raw) {
        Ok(url) => {
            if let Some(host) = url.host_str() {
                if !host_is_linkedin(host) {
                    return Err(InvalidProfile::new(raw, "URL host is not linkedin.com"));
                }
            }
            url.path().to_string()
        }
        Err(_) => raw.to_string(),
    };

    let trimmed = path.strip_prefix('/').unwrap_or(&path);
    let trimmed = trimmed.strip_suffix('/').unwrap_or(trimmed);

    let handle = if !trimmed.contains('/') {
        trimmed
    } else {
        let Some(handle) = trimmed.strip_prefix(PROFILE_PREFIX) else {
            return Err(InvalidProfile::new(raw, "path does not start with in/"));
        };
        if handle.contains('/') {
            return Err(InvalidProfile::new(raw, "path has more than one segment after in/"));
        }
        handle
    };

    let handle = urlencoding::decode(handle)
        .map_err(|_| InvalidProfile::new(raw, "handle is not valid UTF-8 once decoded"))?;
    // A decoded '%' would decode again on the next pass
    if handle.contains('%') {
        return Err(InvalidProfile::new(raw, "handle contains a literal '%'"));
    }

    let candidate = format!("{PROFILE_PREFIX}{handle}/");
    if !is_canonical(&candidate) {
        return Err(InvalidProfile::new(raw, "profile handle is empty or contains '/'"));
    }

    Ok(ProfileId(candidate))
}

/// `.`/`..` path segments, plain or percent-encoded, before any query or
/// fragment. `Url::parse` would silently resolve them.
fn has_dot_segment(raw: &str) -> bool {
    let path = raw.split(['?', '#']).next().unwrap_or(raw);
    path.split(['/', '\\']).any(|segment| {
        let segment = segment.to_ascii_lowercase().replace("%2e", ".");
        segment == "." || segment == ".."
    })
}

fn host_is_linkedin(host: &str) -> bool {
    host.len()
        .checked_sub(PROFILE_HOST_SUFFIX.len())
        .and_then(|start| host.get(start..))
        .is_some_and(|tail| tail.eq_ignore_ascii_case(PROFILE_HOST_SUFFIX))
}

/// `in/` + one or more non-slash characters + `/`
fn is_canonical(s: &str) -> bool {
    s.strip_prefix(PROFILE_PREFIX)
        .and_then(|rest| rest.strip_suffix('/'))
        .is_some_and(|handle| !handle.is_empty() && !handle.contains('/'))
}

// ============================================================================
// Tests
// ============================================================================
